//! PDF error types.

use thiserror::Error;

/// Errors raised while rendering a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// A builtin font could not be registered.
    #[error("failed to load font: {0}")]
    Font(String),

    /// Serializing the finished document failed.
    #[error("failed to write PDF: {0}")]
    Write(String),

    /// The requested template preset does not exist.
    #[error("unknown PDF template: {0}")]
    UnknownTemplate(String),
}
