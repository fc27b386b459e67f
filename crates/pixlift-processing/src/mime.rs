//! Filename to MIME type lookup for the file part.

use std::path::Path;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Resolves the `Content-Type` of the file part from its path.
pub trait MimeLookup: Send + Sync {
    fn mime_type(&self, path: &Path) -> String;
}

/// Extension-based lookup covering common image, video, audio and document types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMimeLookup;

impl ExtensionMimeLookup {
    pub fn detect(extension: &str) -> Option<&'static str> {
        let mime = match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "heif" => "image/heif",
            "avif" => "image/avif",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            "svg" => "image/svg+xml",
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mp3" => "audio/mpeg",
            "m4a" => "audio/mp4",
            "wav" => "audio/wav",
            "pdf" => "application/pdf",
            "json" => "application/json",
            "txt" => "text/plain",
            "csv" => "text/csv",
            "zip" => "application/zip",
            _ => return None,
        };
        Some(mime)
    }
}

impl MimeLookup for ExtensionMimeLookup {
    fn mime_type(&self, path: &Path) -> String {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::detect)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string()
    }
}
