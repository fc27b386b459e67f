use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use pixlift_core::OutputFormat;
use std::io::Cursor;

use crate::error::PreprocessError;

/// Encodes resized rasters into the requested output format.
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode `img` at its exact pixel size. `quality` is used for lossy formats only.
    pub fn compress(
        img: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Bytes, PreprocessError> {
        match format {
            OutputFormat::Jpeg => Self::compress_jpeg(img, quality),
            OutputFormat::Png => Self::compress_png(img),
        }
    }

    fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, PreprocessError> {
        // JPEG has no alpha channel
        let rgb_img = img.to_rgb8();

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb_img
            .write_with_encoder(encoder)
            .map_err(PreprocessError::Encode)?;

        Ok(Bytes::from(buffer))
    }

    fn compress_png(img: &DynamicImage) -> Result<Bytes, PreprocessError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)
            .map_err(PreprocessError::Encode)?;

        Ok(Bytes::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 128, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let img = create_test_image(64, 32);
        let data = ImageCompressor::compress(&img, OutputFormat::Jpeg, 80).unwrap();

        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.dimensions(), (64, 32));
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_jpeg_quality_changes_size() {
        let img = create_test_image(128, 128);
        let low = ImageCompressor::compress(&img, OutputFormat::Jpeg, 10).unwrap();
        let high = ImageCompressor::compress(&img, OutputFormat::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_png_ignores_quality() {
        let img = create_test_image(32, 32);
        let a = ImageCompressor::compress(&img, OutputFormat::Png, 10).unwrap();
        let b = ImageCompressor::compress(&img, OutputFormat::Png, 95).unwrap();
        assert_eq!(a, b);
        assert_eq!(image::guess_format(&a).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_zero_quality_is_clamped() {
        let img = create_test_image(16, 16);
        assert!(ImageCompressor::compress(&img, OutputFormat::Jpeg, 0).is_ok());
    }
}
