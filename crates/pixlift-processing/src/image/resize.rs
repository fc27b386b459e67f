use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::PreprocessError;

/// Bounded, aspect-preserving resize. Never enlarges.
pub struct ImageResize;

impl ImageResize {
    /// Target dimensions for an image of `orig_width`x`orig_height` fitted inside
    /// the given bounds. A missing bound leaves that axis unconstrained.
    ///
    /// The scale factor is `min(max_w / w, max_h / h, 1.0)` applied to both axes,
    /// with the results floored so they never exceed a bound. Returns `None`
    /// when a side floors to zero: no raster fits inside those bounds.
    pub fn calculate_dimensions(
        orig_width: u32,
        orig_height: u32,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Option<(u32, u32)> {
        let max_width = max_width.unwrap_or(u32::MAX);
        let max_height = max_height.unwrap_or(u32::MAX);

        if orig_width == 0 || orig_height == 0 {
            return None;
        }
        if max_width >= orig_width && max_height >= orig_height {
            return Some((orig_width, orig_height));
        }

        let (w, h) = (orig_width as u64, orig_height as u64);
        let (mw, mh) = (max_width as u64, max_height as u64);

        // Compare mw/w against mh/h without going through floats.
        let (new_width, new_height) = if mw * h <= mh * w {
            (mw, h * mw / w)
        } else {
            (w * mh / h, mh)
        };

        if new_width == 0 || new_height == 0 {
            return None;
        }
        Some((new_width as u32, new_height as u32))
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Fit `img` inside the bounds. Returns the input unchanged when no
    /// downscale is needed.
    pub fn fit_within(
        img: DynamicImage,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Result<DynamicImage, PreprocessError> {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) =
            Self::calculate_dimensions(orig_width, orig_height, max_width, max_height).ok_or(
                PreprocessError::InvalidBounds {
                    width: orig_width,
                    height: orig_height,
                    max_width,
                    max_height,
                },
            )?;

        if (width, height) == (orig_width, orig_height) {
            return Ok(img);
        }

        let filter = Self::select_filter(orig_width, orig_height, width, height);
        Ok(img.resize_exact(width, height, filter))
    }
}
