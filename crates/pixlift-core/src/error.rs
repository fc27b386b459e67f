//! Error types module
//!
//! `UploadError` is the single error type delivered through an upload's completion
//! slot. Decode and extraction failures are also representable so the pipeline can
//! report them for diagnostics, but they never reach the completion slot on their
//! own: a failed resize or metadata read degrades to "no metadata injected".

/// Error produced while running one upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The upload was cancelled (or the scheduler closed) before its pipeline began.
    #[error("Upload cancelled before start")]
    Cancelled,

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Metadata extraction error: {0}")]
    Extraction(String),

    #[error("Multipart encoding error: {0}")]
    Encoding(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Destination URL, method or header could not be turned into an HTTP request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The scheduler or its runtime went away before the upload could complete.
    #[error("Upload abandoned before completion")]
    Abandoned,
}

impl UploadError {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::Cancelled => "CANCELLED",
            UploadError::Decode(_) => "DECODE_ERROR",
            UploadError::Extraction(_) => "EXTRACTION_ERROR",
            UploadError::Encoding(_) => "ENCODING_ERROR",
            UploadError::Transport(_) => "TRANSPORT_ERROR",
            UploadError::InvalidRequest(_) => "INVALID_REQUEST",
            UploadError::Abandoned => "ABANDONED",
        }
    }

    /// Whether this error can end an upload. Decode and extraction errors are
    /// absorbed by the pipeline and never delivered as the final result.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, UploadError::Decode(_) | UploadError::Extraction(_))
    }

    pub fn encoding(err: impl std::fmt::Display) -> Self {
        UploadError::Encoding(err.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        UploadError::Transport(err.to_string())
    }
}
