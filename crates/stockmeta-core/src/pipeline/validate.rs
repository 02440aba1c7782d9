//! Input validation before an image is sent to a provider.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates and loads image files.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check the file and read its bytes.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    /// - File starts with the signature of a supported format
    pub async fn load(&self, path: &Path) -> Result<Vec<u8>, PipelineError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(PipelineError::Read {
                    path: path.to_path_buf(),
                    message: format!("Cannot read metadata: {e}"),
                });
            }
        };

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if !Self::is_valid_image_header(&bytes) {
            return Err(PipelineError::Read {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(bytes)
    }

    /// Check if the leading bytes match a format ExifTool can tag.
    fn is_valid_image_header(header: &[u8]) -> bool {
        if header.len() < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[0] == 0x89 && header[1] == b'P' && header[2] == b'N' && header[3] == b'G' {
            return true;
        }

        // TIFF: II (little-endian) or MM (big-endian) followed by version 42
        let is_tiff_le =
            header[0] == b'I' && header[1] == b'I' && header[2] == 0x2A && header[3] == 0x00;
        let is_tiff_be =
            header[0] == b'M' && header[1] == b'M' && header[2] == 0x00 && header[3] == 0x2A;
        if is_tiff_le || is_tiff_be {
            return true;
        }

        // Photoshop: 8BPS
        header.starts_with(b"8BPS")
    }
}
