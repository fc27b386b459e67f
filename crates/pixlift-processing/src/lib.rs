//! Pixlift processing
//!
//! Synchronous building blocks of the upload pipeline:
//! - image preprocessing (bounded resize and re-encode)
//! - header-only metadata extraction
//! - multipart/form-data body encoding with MIME lookup
//!
//! Everything here is blocking and holds no shared state; callers on an async
//! runtime should run these on a blocking thread.

pub mod compression;
pub mod error;
pub mod image;
pub mod mime;
pub mod multipart;

pub use error::{ExtractionError, MultipartError, PreprocessError};
pub use crate::image::{extract_metadata, preprocess, ImageResize, PreprocessedImage};
pub use mime::{ExtensionMimeLookup, MimeLookup};
pub use multipart::MultipartEncoder;
