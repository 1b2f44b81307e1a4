use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Media-type tag prepended to base64 image data on the wire.
pub const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid base64 image payload: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_to_bytes(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(encoded)?)
}

pub fn to_data_uri(base64: &str) -> String {
    format!("{DATA_URI_PREFIX}{base64}")
}

/// Strips [`DATA_URI_PREFIX`] when present; bare base64 passes through untouched.
pub fn from_data_uri(payload: &str) -> &str {
    payload.strip_prefix(DATA_URI_PREFIX).unwrap_or(payload)
}

pub fn encode_image_payload(bytes: &[u8]) -> String {
    to_data_uri(&bytes_to_base64(bytes))
}

/// Accepts either wire form (data URI or bare base64).
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, DecodeError> {
    base64_to_bytes(from_data_uri(payload))
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
