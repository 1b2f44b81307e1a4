use std::sync::Arc;

use shared::{
    codec::encode_image_payload,
    error::{ApiError, ErrorCode},
    protocol::GenerateImageResponse,
};
use thiserror::Error;
use tracing::{info, warn};

pub mod backend;
pub mod openai;

pub use backend::{BackendError, ImageBackend, MissingImageBackend};

const QUOTA_SUGGESTION: &str =
    "Check the billing status of the image backend account or switch to a different API key.";

#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<dyn ImageBackend>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("failed to generate image")]
    EmptyResult,
    #[error("image backend usage limit reached: {0}")]
    QuotaExhausted(String),
    #[error("server error")]
    Backend(#[source] anyhow::Error),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyPrompt => ErrorCode::Validation,
            Self::EmptyResult => ErrorCode::EmptyResult,
            Self::QuotaExhausted(_) => ErrorCode::QuotaExhausted,
            Self::Backend(_) => ErrorCode::Internal,
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::QuotaExhausted(detail) => Self::QuotaExhausted(detail),
            BackendError::Failed(source) => Self::Backend(source),
        }
    }
}

impl From<&ServiceError> for ApiError {
    fn from(value: &ServiceError) -> Self {
        match value {
            // Backend detail stays server-side.
            ServiceError::QuotaExhausted(_) => ApiError::new(
                ErrorCode::QuotaExhausted,
                "image backend usage limit reached",
            )
            .with_suggestion(QUOTA_SUGGESTION),
            other => ApiError::new(other.code(), other.to_string()),
        }
    }
}

pub async fn generate_image(
    ctx: &ApiContext,
    prompt: &str,
) -> Result<GenerateImageResponse, ServiceError> {
    if prompt.trim().is_empty() {
        return Err(ServiceError::EmptyPrompt);
    }

    let bytes = ctx.backend.generate(prompt).await?;
    if bytes.is_empty() {
        warn!(prompt_len = prompt.len(), "image backend returned no bytes");
        return Err(ServiceError::EmptyResult);
    }

    info!(
        prompt_len = prompt.len(),
        image_bytes = bytes.len(),
        "image generated"
    );
    Ok(GenerateImageResponse {
        image: encode_image_payload(&bytes),
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
