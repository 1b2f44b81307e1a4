use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("image backend usage limit reached: {0}")]
    QuotaExhausted(String),
    #[error("image backend failed: {0}")]
    Failed(#[source] anyhow::Error),
}

/// Opaque prompt -> image bytes capability. An empty result means the backend
/// answered but produced no image.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BackendError>;
}

pub struct MissingImageBackend;

#[async_trait]
impl ImageBackend for MissingImageBackend {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Failed(anyhow::anyhow!(
            "image backend is unavailable"
        )))
    }
}
