//! Upload results: response data, HTTP metadata, and preprocessing outcome.

use serde::{Deserialize, Serialize};

/// How the response body should be surfaced to the caller.
///
/// See <https://developer.mozilla.org/en-US/docs/Web/API/XMLHttpRequest/responseType>.
/// Unknown values fall back to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ResponseType {
    ArrayBuffer,
    Blob,
    Document,
    Json,
    #[default]
    Text,
}

impl ResponseType {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "arraybuffer" => ResponseType::ArrayBuffer,
            "blob" => ResponseType::Blob,
            "document" => ResponseType::Document,
            "json" => ResponseType::Json,
            _ => ResponseType::Text,
        }
    }

    /// Binary response types are surfaced base64-encoded.
    pub fn is_binary(self) -> bool {
        matches!(self, ResponseType::ArrayBuffer | ResponseType::Blob)
    }
}

impl From<String> for ResponseType {
    fn from(value: String) -> Self {
        ResponseType::parse(&value)
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Text(String),
    Json(serde_json::Value),
    Base64(String),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) | ResponseData::Base64(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Pixel dimensions and byte size computed for the uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

/// Which branch of the resize → extraction → nothing chain produced metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PreprocessOutcome {
    /// Resize succeeded; metadata describes the re-encoded image that was uploaded.
    Resized(ImageMetadata),
    /// Metadata was read from the original file. `resize_error` is set when a
    /// resize was requested and failed.
    Extracted {
        metadata: ImageMetadata,
        resize_error: Option<String>,
    },
    /// No metadata could be computed; the upload proceeds without it.
    Unavailable {
        resize_error: Option<String>,
        extraction_error: String,
    },
}

impl PreprocessOutcome {
    pub fn metadata(&self) -> Option<&ImageMetadata> {
        match self {
            PreprocessOutcome::Resized(metadata) => Some(metadata),
            PreprocessOutcome::Extracted { metadata, .. } => Some(metadata),
            PreprocessOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_resized(&self) -> bool {
        matches!(self, PreprocessOutcome::Resized(_))
    }

    pub fn resize_error(&self) -> Option<&str> {
        match self {
            PreprocessOutcome::Resized(_) => None,
            PreprocessOutcome::Extracted { resize_error, .. }
            | PreprocessOutcome::Unavailable { resize_error, .. } => resize_error.as_deref(),
        }
    }
}

/// Successful transfer: the server answered (with any status).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Response headers; repeated headers are joined with `", "`.
    pub headers: Vec<(String, String)>,
    pub data: ResponseData,
    pub preprocessing: PreprocessOutcome,
}

impl UploadResponse {
    /// True when the server answered with an error status (>= 400).
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_type_parse() {
        assert_eq!(ResponseType::parse("json"), ResponseType::Json);
        assert_eq!(ResponseType::parse("ArrayBuffer"), ResponseType::ArrayBuffer);
        assert_eq!(ResponseType::parse("BLOB"), ResponseType::Blob);
        assert_eq!(ResponseType::parse("document"), ResponseType::Document);
        assert_eq!(ResponseType::parse("whatever"), ResponseType::Text);
        assert!(ResponseType::Blob.is_binary());
        assert!(!ResponseType::Json.is_binary());
    }

    #[test]
    fn test_response_type_deserialize_unknown_falls_back() {
        let value: ResponseType = serde_json::from_str(r#""nope""#).unwrap();
        assert_eq!(value, ResponseType::Text);
        let value: ResponseType = serde_json::from_str(r#""arraybuffer""#).unwrap();
        assert_eq!(value, ResponseType::ArrayBuffer);
    }

    #[test]
    fn test_preprocess_outcome_accessors() {
        let metadata = ImageMetadata {
            width: 10,
            height: 20,
            byte_size: 30,
        };

        let resized = PreprocessOutcome::Resized(metadata);
        assert!(resized.is_resized());
        assert_eq!(resized.metadata(), Some(&metadata));
        assert_eq!(resized.resize_error(), None);

        let fallback = PreprocessOutcome::Extracted {
            metadata,
            resize_error: Some("decode failed".into()),
        };
        assert!(!fallback.is_resized());
        assert_eq!(fallback.resize_error(), Some("decode failed"));

        let none = PreprocessOutcome::Unavailable {
            resize_error: None,
            extraction_error: "not an image".into(),
        };
        assert_eq!(none.metadata(), None);
    }

    #[test]
    fn test_response_header_lookup_and_error_flag() {
        let response = UploadResponse {
            status: 404,
            url: "https://example.com".into(),
            headers: vec![("Content-Type".into(), "text/plain".into())],
            data: ResponseData::Text("missing".into()),
            preprocessing: PreprocessOutcome::Unavailable {
                resize_error: None,
                extraction_error: "n/a".into(),
            },
        };
        assert!(response.is_error());
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-missing"), None);
    }
}
