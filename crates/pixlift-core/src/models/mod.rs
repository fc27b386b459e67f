//! Domain models for upload requests and their results.

pub mod fields;
pub mod request;
pub mod resize;
pub mod response;

pub use fields::{FieldValue, FormFields};
pub use request::{Destination, MetadataFieldNames, MetadataTarget, UploadRequest};
pub use resize::{OutputFormat, ResizeOptions};
pub use response::{ImageMetadata, PreprocessOutcome, ResponseData, ResponseType, UploadResponse};
