//! Error types for gpxqr operations

use thiserror::Error;

/// Result type alias using gpxqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gpxqr operations
#[derive(Error, Debug)]
pub enum Error {
    /// The track file is not well-formed GPX
    #[error("Failed to parse track file: {0}")]
    Parse(String),

    /// A template references an unknown field or is malformed
    #[error("Invalid template '{template}': {reason}")]
    Template {
        /// The offending template source
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// QR code encoding failed (payload too long for any QR version)
    #[error("Failed to encode QR code: {0}")]
    Encoding(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// A generated QR code does not decode back to its URL
    #[error("QR code for '{url}' decoded as '{decoded}'")]
    Verification {
        /// URL that was encoded
        url: String,
        /// Payload read back from the bitmap
        decoded: String,
    },

    /// Font loading failed
    #[error("Font error: {0}")]
    Font(String),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Archive(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        Error::Template {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Archive(e.to_string())
    }
}
