use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("unsupported image file extension: {0:?}")]
    UnsupportedExtension(String),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write image file: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores generated images. Creates `folder` if needed and overwrites an
/// existing file with the same name.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, bytes: &[u8], folder: &Path, filename: &str)
        -> Result<PathBuf, SaveError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveFormat {
    Png,
    Jpeg,
}

fn save_format(filename: &str) -> Result<SaveFormat, SaveError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "png" => Ok(SaveFormat::Png),
        "jpg" | "jpeg" => Ok(SaveFormat::Jpeg),
        _ => Err(SaveError::UnsupportedExtension(extension)),
    }
}

fn transcode_to_jpeg(png_bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(png_bytes)?;
    let mut out = Cursor::new(Vec::new());
    // JPEG has no alpha channel.
    DynamicImage::ImageRgb8(decoded.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

pub struct FsImageStore;

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(
        &self,
        bytes: &[u8],
        folder: &Path,
        filename: &str,
    ) -> Result<PathBuf, SaveError> {
        let format = save_format(filename)?;
        let encoded = match format {
            SaveFormat::Png => bytes.to_vec(),
            SaveFormat::Jpeg => transcode_to_jpeg(bytes)?,
        };

        tokio::fs::create_dir_all(folder).await?;
        let path = folder.join(filename);
        tokio::fs::write(&path, encoded).await?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
