//! Upload pipeline
//!
//! Turns one [`UploadRequest`] into one [`UploadResult`]:
//!
//! 1. resize when requested, writing the re-encoded image to a temporary file
//! 2. otherwise, or when resize fails, read metadata from the original file
//! 3. merge the metadata into a copy of the form fields (computed values win)
//! 4. encode the multipart body; the temporary file is deleted afterwards
//! 5. send through the shared transport
//!
//! Resize and extraction failures only change which metadata is injected.
//! Encoding, request and transport failures end the upload.

use pixlift_client::{TransferRequest, UploadTransport};
use pixlift_core::{
    FormFields, ImageMetadata, MetadataTarget, PreprocessOutcome, ResizeOptions, UploadError,
    UploadRequest, UploadResult,
};
use pixlift_processing::{extract_metadata, preprocess, MultipartEncoder};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Body ready for transfer, with the branch that produced its metadata.
#[derive(Debug)]
pub struct PreparedBody {
    pub outcome: PreprocessOutcome,
    /// Computed metadata under the request's configured names; empty when none.
    pub metadata_fields: FormFields,
    pub body: Vec<u8>,
}

/// Upload source after the resize step.
struct Source {
    metadata: Option<ImageMetadata>,
    resize_error: Option<String>,
    /// Keeps the re-encoded file alive until the body is built.
    resized: Option<NamedTempFile>,
}

fn write_temp_image(
    bytes: &[u8],
    extension: &str,
    temp_dir: &Path,
) -> std::io::Result<NamedTempFile> {
    let name = Uuid::new_v4().to_string();
    let suffix = format!(".{extension}");
    let mut file = tempfile::Builder::new()
        .prefix(&name)
        .suffix(&suffix)
        .rand_bytes(0)
        .tempfile_in(temp_dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn resize_source(
    upload_id: &str,
    source_path: &Path,
    options: &ResizeOptions,
    temp_dir: &Path,
) -> Source {
    let resized = std::fs::read(source_path)
        .map_err(|e| format!("Failed to read source image: {e}"))
        .and_then(|bytes| preprocess(&bytes, options).map_err(|e| e.to_string()))
        .and_then(|image| {
            let file = write_temp_image(&image.encoded, options.format.extension(), temp_dir)
                .map_err(|e| format!("Failed to write resized image: {e}"))?;
            Ok((image.metadata(), file))
        });

    match resized {
        Ok((metadata, file)) => {
            tracing::debug!(
                upload_id = %upload_id,
                width = metadata.width,
                height = metadata.height,
                byte_size = metadata.byte_size,
                temp_path = %file.path().display(),
                "Image resized"
            );
            Source {
                metadata: Some(metadata),
                resize_error: None,
                resized: Some(file),
            }
        }
        Err(error) => {
            tracing::warn!(
                upload_id = %upload_id,
                error = %error,
                "Resize failed, falling back to original file"
            );
            Source {
                metadata: None,
                resize_error: Some(error),
                resized: None,
            }
        }
    }
}

/// Steps 1 to 4. Blocking: file reads, image codecs and body assembly.
pub fn prepare_body(request: &UploadRequest, temp_dir: &Path) -> Result<PreparedBody, UploadError> {
    let upload_id = request.id.as_str();

    let source = match &request.resize {
        Some(options) => resize_source(upload_id, &request.source_path, options, temp_dir),
        None => Source {
            metadata: None,
            resize_error: None,
            resized: None,
        },
    };

    let (outcome, upload_path) = match (source.metadata, &source.resized) {
        (Some(metadata), Some(file)) => {
            (PreprocessOutcome::Resized(metadata), file.path().to_path_buf())
        }
        _ => {
            let outcome = match extract_metadata(&request.source_path) {
                Ok(metadata) => PreprocessOutcome::Extracted {
                    metadata,
                    resize_error: source.resize_error,
                },
                Err(e) => {
                    tracing::warn!(
                        upload_id = %upload_id,
                        error = %e,
                        "Metadata extraction failed, uploading without metadata"
                    );
                    PreprocessOutcome::Unavailable {
                        resize_error: source.resize_error,
                        extraction_error: e.to_string(),
                    }
                }
            };
            (outcome, request.source_path.clone())
        }
    };

    let metadata_fields = outcome
        .metadata()
        .map(|metadata| request.metadata_names.to_fields(metadata))
        .unwrap_or_default();

    let mut fields = request.fields.clone();
    fields.merge(metadata_fields.clone());

    let body = MultipartEncoder::new().encode(
        &fields,
        &upload_path,
        &request.file_field_name,
        &request.boundary,
    )?;

    // The body owns the bytes now; remove the re-encoded file.
    drop(source.resized);

    Ok(PreparedBody {
        outcome,
        metadata_fields,
        body,
    })
}

/// Run the full pipeline for `request`.
#[tracing::instrument(
    skip(request, transport, temp_dir),
    fields(upload_id = %request.id, source = %request.source_path.display())
)]
pub async fn run_pipeline(
    request: UploadRequest,
    transport: &dyn UploadTransport,
    temp_dir: PathBuf,
) -> UploadResult {
    let started = Instant::now();
    tracing::info!("Upload started");

    let (request, prepared) = tokio::task::spawn_blocking(move || {
        let prepared = prepare_body(&request, &temp_dir);
        (request, prepared)
    })
    .await
    .map_err(|e| UploadError::encoding(format!("Body preparation did not complete: {e}")))?;
    let prepared = prepared?;

    let mut transfer = TransferRequest::new(
        request.id.clone(),
        &request.destination,
        request.content_type(),
        prepared.body,
    );
    if request.metadata_target == MetadataTarget::FieldsAndHeaders {
        for (name, value) in prepared.metadata_fields.iter() {
            if let Some(value) = value.as_text() {
                transfer = transfer.with_header(name, value);
            }
        }
    }

    let raw = transport.send(transfer).await?;

    tracing::info!(
        status = raw.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        resized = prepared.outcome.is_resized(),
        "Upload finished"
    );

    Ok(raw.into_upload_response(request.destination.response_type, prepared.outcome))
}
