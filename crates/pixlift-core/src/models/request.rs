//! Upload request model
//!
//! An `UploadRequest` is built by the host application, handed to the scheduler,
//! and never mutated afterwards. The pipeline works on its own copy of the form
//! fields when injecting computed metadata.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::fields::FormFields;
use super::resize::ResizeOptions;
use super::response::{ImageMetadata, ResponseType};

pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_FILE_FIELD_NAME: &str = "file";
pub const DEFAULT_WIDTH_FIELD: &str = "X-Image-Width";
pub const DEFAULT_HEIGHT_FIELD: &str = "X-Image-Height";
pub const DEFAULT_SIZE_FIELD: &str = "X-File-Size";

/// Target of the HTTP transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Caller headers, sent in order. `Content-Type` is always overridden by the
    /// multipart content type.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to `url`.
    #[serde(default)]
    pub params: Vec<(String, String)>,
    #[serde(default)]
    pub response_type: ResponseType,
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

impl Destination {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: Vec::new(),
            params: Vec::new(),
            response_type: ResponseType::default(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// Names under which computed width, height and byte size are injected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFieldNames {
    pub width: String,
    pub height: String,
    pub byte_size: String,
}

impl Default for MetadataFieldNames {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH_FIELD.to_string(),
            height: DEFAULT_HEIGHT_FIELD.to_string(),
            byte_size: DEFAULT_SIZE_FIELD.to_string(),
        }
    }
}

impl MetadataFieldNames {
    /// Render computed metadata as form fields under the configured names.
    pub fn to_fields(&self, metadata: &ImageMetadata) -> FormFields {
        let mut fields = FormFields::new();
        fields.insert(self.width.clone(), metadata.width.to_string());
        fields.insert(self.height.clone(), metadata.height.to_string());
        fields.insert(self.byte_size.clone(), metadata.byte_size.to_string());
        fields
    }
}

/// Where computed metadata is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataTarget {
    /// Form fields only.
    #[default]
    Fields,
    /// Form fields, and the same names as HTTP request headers.
    FieldsAndHeaders,
}

/// One file upload, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Correlation id used in diagnostics and for `cancel`.
    pub id: String,
    pub destination: Destination,
    pub source_path: PathBuf,
    pub fields: FormFields,
    pub file_field_name: String,
    pub resize: Option<ResizeOptions>,
    pub metadata_names: MetadataFieldNames,
    pub metadata_target: MetadataTarget,
    /// Multipart boundary. Must not occur inside any part's content.
    pub boundary: String,
}

impl UploadRequest {
    /// New request with a fresh id and boundary, no fields and no resize.
    pub fn new(destination: Destination, source_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            destination,
            source_path: source_path.into(),
            fields: FormFields::new(),
            file_field_name: DEFAULT_FILE_FIELD_NAME.to_string(),
            resize: None,
            metadata_names: MetadataFieldNames::default(),
            metadata_target: MetadataTarget::default(),
            boundary: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_fields(mut self, fields: FormFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_file_field_name(mut self, name: impl Into<String>) -> Self {
        self.file_field_name = name.into();
        self
    }

    pub fn with_resize(mut self, options: ResizeOptions) -> Self {
        self.resize = Some(options);
        self
    }

    pub fn with_metadata_names(mut self, names: MetadataFieldNames) -> Self {
        self.metadata_names = names;
        self
    }

    pub fn with_metadata_target(mut self, target: MetadataTarget) -> Self {
        self.metadata_target = target;
        self
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// `Content-Type` header value for this request's body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}
