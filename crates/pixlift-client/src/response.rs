//! Response building
//!
//! Turns the raw status, headers and body of a finished transfer into the
//! caller-facing `UploadResponse`. A response with an error status is still a
//! completed transfer; `UploadResponse::is_error` reports it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use pixlift_core::{PreprocessOutcome, ResponseData, ResponseType, UploadResponse};

/// What came back from the server, before body decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// One entry per header name, repeated values joined with `", "`.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_upload_response(
        self,
        response_type: ResponseType,
        preprocessing: PreprocessOutcome,
    ) -> UploadResponse {
        let data = decode_body(&self, response_type);
        UploadResponse {
            status: self.status,
            url: self.url,
            headers: self.headers,
            data,
            preprocessing,
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("application/json") || content_type.contains("application/vnd.api+json")
}

/// Decode the body according to the server's content type and the requested
/// response type. A JSON content type wins over the requested type; bodies that
/// fail to parse as JSON fall back to text.
pub fn decode_body(raw: &RawResponse, response_type: ResponseType) -> ResponseData {
    let json_content = raw
        .header("content-type")
        .map(is_json_content_type)
        .unwrap_or(false);

    if json_content || response_type == ResponseType::Json {
        if let Ok(value) = serde_json::from_slice(&raw.body) {
            return ResponseData::Json(value);
        }
    }

    if response_type.is_binary() {
        return ResponseData::Base64(STANDARD.encode(&raw.body));
    }

    ResponseData::Text(String::from_utf8_lossy(&raw.body).into_owned())
}
