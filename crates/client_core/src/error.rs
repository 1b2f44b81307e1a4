use reqwest::StatusCode;
use serde::Deserialize;
use shared::{
    codec::DecodeError,
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    QuotaExhausted(String),
    #[error("{0}")]
    EmptyResult(String),
    #[error("{0}")]
    Fault(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl GenerationError {
    /// Transport and server faults, including undecodable payloads.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_) | Self::Decode(_))
    }

    pub(crate) fn from_error_response(status: StatusCode, body: &str) -> Self {
        let Ok(body) = serde_json::from_str::<ErrorBody>(body) else {
            return Self::Fault(format!("image generation service returned {status}"));
        };
        let api_error = body.into_api_error();
        let message = api_error.display_message();
        if message.is_empty() {
            return Self::Fault(format!("image generation service returned {status}"));
        }

        // Unknown codes are treated like a missing one.
        let code = api_error.code.unwrap_or(match status {
            StatusCode::BAD_REQUEST => ErrorCode::Validation,
            StatusCode::NOT_FOUND => ErrorCode::EmptyResult,
            _ => ErrorCode::Internal,
        });

        match code {
            ErrorCode::Validation => Self::Validation(message),
            ErrorCode::QuotaExhausted => Self::QuotaExhausted(message),
            ErrorCode::EmptyResult => Self::EmptyResult(message),
            ErrorCode::Internal => Self::Fault(message),
        }
    }
}

/// Error body as received. Every field is optional and `code` may carry a value
/// this client does not know.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
}

impl ErrorBody {
    fn into_api_error(self) -> ApiError {
        ApiError {
            code: self
                .code
                .and_then(|code| serde_json::from_value::<ErrorCode>(code).ok()),
            error: self.error.unwrap_or_default(),
            suggestion: self.suggestion,
        }
    }
}
