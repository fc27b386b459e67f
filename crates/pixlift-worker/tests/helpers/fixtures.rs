use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Solid-colour PNG of the given size.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([200, 40, 90]))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}
