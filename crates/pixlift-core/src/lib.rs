//! Pixlift Core Library
//!
//! This crate provides the domain models, error types and configuration that are
//! shared across all pixlift components: the processing crate, the HTTP client,
//! and the upload scheduler.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{LogFormat, SchedulerConfig, TelemetryConfig};
pub use error::UploadError;
pub use models::{
    Destination, FieldValue, FormFields, ImageMetadata, MetadataFieldNames, MetadataTarget,
    OutputFormat, PreprocessOutcome, ResizeOptions, ResponseData, ResponseType, UploadRequest,
    UploadResponse,
};

/// Result delivered exactly once for every submitted upload.
pub type UploadResult = Result<UploadResponse, UploadError>;
