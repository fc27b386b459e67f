//! Processing errors
//!
//! Preprocessing and extraction failures are recoverable: the pipeline falls
//! back and records them. Multipart failures end the upload.

use pixlift_core::UploadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Source image has no pixels")]
    Empty,

    #[error("No {width}x{height} downscale fits within {max_width:?}x{max_height:?}")]
    InvalidBounds {
        width: u32,
        height: u32,
        max_width: Option<u32>,
        max_height: Option<u32>,
    },

    #[error("Failed to encode resized image: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a recognizable image: {0}")]
    Unrecognized(#[source] image::ImageError),
}

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("Failed to read upload source {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<PreprocessError> for UploadError {
    fn from(err: PreprocessError) -> Self {
        UploadError::Decode(err.to_string())
    }
}

impl From<ExtractionError> for UploadError {
    fn from(err: ExtractionError) -> Self {
        UploadError::Extraction(err.to_string())
    }
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Encoding(err.to_string())
    }
}
