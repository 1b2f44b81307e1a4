use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    codec::decode_image_payload,
    protocol::{GenerateImageRequest, GenerateImageResponse, GENERATE_IMAGE_ROUTE},
};
use tracing::warn;
use url::Url;

use crate::error::GenerationError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:7110";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const UNREACHABLE_MESSAGE: &str = "image generation service is unreachable";
const MALFORMED_RESPONSE_MESSAGE: &str = "image generation service sent a malformed response";
const EMPTY_IMAGE_MESSAGE: &str = "failed to generate image";

/// One prompt, one attempt. Retrying is left to the caller.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_url: String,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct HttpGenerationGateway {
    http: Client,
    endpoint: Url,
}

impl HttpGenerationGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let base = Url::parse(config.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", config.server_url))?;
        let endpoint = base
            .join(GENERATE_IMAGE_ROUTE)
            .context("failed to build image generation endpoint")?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationGateway for HttpGenerationGateway {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GenerateImageRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|error| {
                warn!(%error, endpoint = %self.endpoint, "image generation request failed");
                GenerationError::Fault(UNREACHABLE_MESSAGE.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = GenerationError::from_error_response(status, &body);
            warn!(%status, error = %err, "image generation service returned an error");
            return Err(err);
        }

        let body: GenerateImageResponse = response.json().await.map_err(|error| {
            warn!(%error, "image generation response could not be parsed");
            GenerationError::Fault(MALFORMED_RESPONSE_MESSAGE.to_string())
        })?;

        let bytes = decode_image_payload(&body.image)?;
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResult(EMPTY_IMAGE_MESSAGE.to_string()));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
