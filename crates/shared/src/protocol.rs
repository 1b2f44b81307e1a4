use serde::{Deserialize, Serialize};

pub const GENERATE_IMAGE_ROUTE: &str = "/api/images/generate";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
}

/// `image` carries a data URI (`data:image/png;base64,...`); readers should go
/// through [`crate::codec::decode_image_payload`] so bare base64 is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    pub image: String,
}
