//! Error types for mediashelf.

use thiserror::Error;

/// Common error type for mediashelf.
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O error on the primary asset tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error.
    ///
    /// Only produced inside the thumbnail pipeline, which swallows it.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A rename target already exists.
    #[error("name conflict: {0} already exists")]
    NameConflict(String),

    /// A move target already exists.
    #[error("destination exists: {0}")]
    DestinationExists(String),

    /// No free `(copy N)` name was found within the attempt limit.
    #[error("no free copy name for {0}")]
    CopyNamesExhausted(String),

    /// Every `-N` variant of a stored upload name is taken.
    #[error("no free upload name for {0}")]
    UploadNamesExhausted(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for mediashelf operations.
pub type Result<T> = std::result::Result<T, MediaError>;
