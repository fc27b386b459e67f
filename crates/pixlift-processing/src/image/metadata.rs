//! Metadata extractor
//!
//! Reads pixel dimensions from the container headers without decoding pixel
//! data. The byte size comes from the filesystem, not the image.

use image::ImageReader;
use pixlift_core::ImageMetadata;
use std::fs;
use std::path::Path;

use crate::error::ExtractionError;

pub fn extract_metadata(path: &Path) -> Result<ImageMetadata, ExtractionError> {
    let io_error = |source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    };

    let byte_size = fs::metadata(path).map_err(io_error)?.len();

    let (width, height) = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?
        .into_dimensions()
        .map_err(ExtractionError::Unrecognized)?;

    Ok(ImageMetadata {
        width,
        height,
        byte_size,
    })
}
