//! Error types for image storage.

use thiserror::Error;

/// Errors that can occur when storing images.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The storage endpoint could not be reached or is not configured.
    #[error("image storage unavailable: {0}")]
    Unavailable(String),

    /// The storage endpoint rejected the upload.
    #[error("upload rejected: {0}")]
    UploadFailed(String),

    /// The image payload itself is unusable.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for image storage operations.
pub type Result<T> = std::result::Result<T, MediaError>;
