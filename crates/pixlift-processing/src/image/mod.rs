//! Image processing module
//!
//! - bounded resize arithmetic and filter selection (resize)
//! - decode, resize and re-encode (preprocessor)
//! - header-only dimension and size lookup (metadata)

pub mod metadata;
pub mod preprocessor;
pub mod resize;

pub use metadata::extract_metadata;
pub use preprocessor::{preprocess, PreprocessedImage};
pub use resize::ImageResize;
