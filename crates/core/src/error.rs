//! Error types for notes extraction, transformation and write-back.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while processing a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// The source file or directory is missing or unreadable, or the
    /// document handle has already been closed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network, authentication or HTTP failure talking to a remote service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response or document part does not match the expected shape.
    #[error("Format error: {0}")]
    Format(String),

    /// A document edit failed for a specific slide (1-based number).
    #[error("Slide {slide}: {message}")]
    Automation { slide: usize, message: String },

    /// Failed to read or write a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    Zip(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build an automation error for the given 1-based slide number.
    pub fn automation(slide: usize, message: impl Into<String>) -> Self {
        Self::Automation {
            slide,
            message: message.into(),
        }
    }

    /// Error for a save that would replace the source presentation.
    pub fn refuse_overwrite(path: &std::path::Path) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("refusing to overwrite source presentation {}", path.display()),
        ))
    }

    /// Map an I/O error raised while opening a source, turning missing and
    /// permission-denied files into [`Error::NotFound`].
    pub fn from_open(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                Self::NotFound(format!("{} does not exist", path.display()))
            }
            std::io::ErrorKind::PermissionDenied => {
                Self::NotFound(format!("no permission to read {}", path.display()))
            }
            _ => Self::Io(err),
        }
    }
}
