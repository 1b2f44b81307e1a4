use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use shared::codec::decode_image_payload;
use tracing::warn;

use crate::backend::{BackendError, ImageBackend};

const QUOTA_MARKERS: [&str; 2] = ["billing_hard_limit_reached", "insufficient_quota"];
const MAX_LOGGED_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub size: String,
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    code: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub struct OpenAiImageBackend {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiImageBackend {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/images/generations",
            self.config.api_base.trim().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ImageBackend for OpenAiImageBackend {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&ImagesRequest {
                model: &self.config.model,
                prompt,
                n: 1,
                size: &self.config.size,
            })
            .send()
            .await
            .context("image backend request failed")
            .map_err(BackendError::Failed)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read image backend response")
            .map_err(BackendError::Failed)?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: ImagesResponse = serde_json::from_str(&body)
            .context("image backend returned malformed JSON")
            .map_err(BackendError::Failed)?;

        let Some(b64) = parsed.data.into_iter().find_map(|item| item.b64_json) else {
            warn!(%status, "image backend response carried no image data");
            return Ok(Vec::new());
        };

        decode_image_payload(&b64)
            .context("image backend returned invalid base64")
            .map_err(BackendError::Failed)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let is_quota = match &parsed {
        Some(envelope) => [
            envelope.error.code.as_deref(),
            envelope.error.kind.as_deref(),
            Some(envelope.error.message.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| QUOTA_MARKERS.iter().any(|marker| field.contains(marker))),
        None => QUOTA_MARKERS.iter().any(|marker| body.contains(marker)),
    };

    let detail = match parsed {
        Some(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.chars().take(MAX_LOGGED_BODY_CHARS).collect(),
    };

    if is_quota {
        BackendError::QuotaExhausted(detail)
    } else {
        BackendError::Failed(anyhow!("image backend returned {status}: {detail}"))
    }
}

#[cfg(test)]
#[path = "tests/openai_tests.rs"]
mod tests;
