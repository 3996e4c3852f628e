use std::path::Path;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::error::ClientError;

/// Compressed image bytes ready for a multipart upload.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    file_name: String,
    mime: &'static str,
}

impl EncodedImage {
    pub fn jpeg(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime: "image/jpeg",
        }
    }

    /// Loads an image file the user picked, rejecting formats the service
    /// would refuse.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let mime = mime_for_extension(&ext).ok_or_else(|| {
            ClientError::Validation(format!(
                "Unsupported image type '{}'; expected one of: {}",
                path.display(),
                IMAGE_EXTENSIONS.join(", ")
            ))
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            ClientError::Validation(format!("Cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("upload.{ext}"));
        Ok(Self {
            bytes,
            file_name,
            mime,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
