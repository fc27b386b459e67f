//! Multipart encoder
//!
//! Builds a `multipart/form-data` body in a single buffer:
//!
//! ```text
//! \r\n--{boundary}\r\n
//! Content-Disposition: form-data; name="key"\r\n
//! Content-Type: text/plain; charset=UTF-8\r\n\r\n
//! {value}
//! ... one part per field value ...
//! \r\n--{boundary}\r\n
//! Content-Disposition: form-data; name="{file field}"; filename="{basename}"\r\n
//! Content-Type: {mime}\r\n\r\n
//! {file bytes}
//! \r\n--{boundary}--\r\n
//! ```
//!
//! A field named `key` is always the first part. List values become repeated
//! parts sharing the field name. The file part is always last.

use pixlift_core::FormFields;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::MultipartError;
use crate::mime::{ExtensionMimeLookup, MimeLookup};

/// Field that receiving services expect as the first part.
pub const LEADING_FIELD: &str = "key";

#[derive(Debug, Clone, Default)]
pub struct MultipartEncoder<M = ExtensionMimeLookup> {
    mime: M,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: MimeLookup> MultipartEncoder<M> {
    pub fn with_mime_lookup(mime: M) -> Self {
        Self { mime }
    }

    /// Encode `fields` followed by the file at `file_path`. The file is read once,
    /// directly into the body buffer.
    pub fn encode(
        &self,
        fields: &FormFields,
        file_path: &Path,
        file_field_name: &str,
        boundary: &str,
    ) -> Result<Vec<u8>, MultipartError> {
        let read_error = |source| MultipartError::ReadFile {
            path: file_path.to_path_buf(),
            source,
        };

        let mut file = File::open(file_path).map_err(read_error)?;
        let file_len = file.metadata().map_err(read_error)?.len() as usize;

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_header = format!(
            "\r\n--{boundary}\r\nContent-Disposition: form-data; name=\"{file_field_name}\"; filename=\"{file_name}\"\r\nContent-Type: {}\r\n\r\n",
            self.mime.mime_type(file_path)
        );
        let trailer = format!("\r\n--{boundary}--\r\n");

        let fields_len: usize = ordered_parts(fields)
            .map(|(name, value)| part_len(boundary, name, value))
            .sum();

        let mut body = Vec::with_capacity(fields_len + file_header.len() + file_len + trailer.len());

        for (name, value) in ordered_parts(fields) {
            write_field_part(&mut body, boundary, name, value);
        }

        body.extend_from_slice(file_header.as_bytes());
        file.read_to_end(&mut body).map_err(read_error)?;
        body.extend_from_slice(trailer.as_bytes());

        Ok(body)
    }
}

/// Every (name, value) part in emission order: `key` first, then the rest.
fn ordered_parts(fields: &FormFields) -> impl Iterator<Item = (&str, &str)> {
    let leading = fields.iter().filter(|(name, _)| *name == LEADING_FIELD);
    let rest = fields.iter().filter(|(name, _)| *name != LEADING_FIELD);
    leading
        .chain(rest)
        .flat_map(|(name, value)| value.values().map(move |v| (name, v)))
}

const PART_PREFIX: &str = "\r\n--";
const DISPOSITION_PREFIX: &str = "\r\nContent-Disposition: form-data; name=\"";
const DISPOSITION_SUFFIX: &str = "\"\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n";

fn part_len(boundary: &str, name: &str, value: &str) -> usize {
    PART_PREFIX.len()
        + boundary.len()
        + DISPOSITION_PREFIX.len()
        + name.len()
        + DISPOSITION_SUFFIX.len()
        + value.len()
}

fn write_field_part(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(PART_PREFIX.as_bytes());
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(DISPOSITION_PREFIX.as_bytes());
    body.extend_from_slice(name.as_bytes());
    body.extend_from_slice(DISPOSITION_SUFFIX.as_bytes());
    body.extend_from_slice(value.as_bytes());
}
