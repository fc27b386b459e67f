//! Image preprocessor
//!
//! Decodes the source bytes, fits the raster inside the requested bounds and
//! re-encodes it. The output raster has exactly the computed pixel dimensions.

use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use pixlift_core::{ImageMetadata, ResizeOptions};
use std::io::Cursor;

use super::resize::ImageResize;
use crate::compression::ImageCompressor;
use crate::error::PreprocessError;

/// Re-encoded image and its measured properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedImage {
    pub encoded: Bytes,
    pub width: u32,
    pub height: u32,
    /// Length of `encoded`, not an estimate.
    pub byte_size: u64,
}

impl PreprocessedImage {
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            width: self.width,
            height: self.height,
            byte_size: self.byte_size,
        }
    }
}

#[tracing::instrument(skip(source), fields(source_len = source.len()))]
pub fn preprocess(
    source: &[u8],
    options: &ResizeOptions,
) -> Result<PreprocessedImage, PreprocessError> {
    let img = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Decode(image::ImageError::IoError(e)))?
        .decode()
        .map_err(PreprocessError::Decode)?;

    let (orig_width, orig_height) = img.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(PreprocessError::Empty);
    }

    let resized = ImageResize::fit_within(img, options.max_width, options.max_height)?;
    let (width, height) = resized.dimensions();

    let encoded = ImageCompressor::compress(&resized, options.format, options.quality)?;
    let byte_size = encoded.len() as u64;

    tracing::debug!(
        orig_width,
        orig_height,
        width,
        height,
        byte_size,
        format = ?options.format,
        "Image preprocessed"
    );

    Ok(PreprocessedImage {
        encoded,
        width,
        height,
        byte_size,
    })
}
