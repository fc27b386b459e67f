use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use pixlift_cli::{collect_fields, parse_key_value};
use pixlift_core::{
    Destination, MetadataTarget, OutputFormat, ResizeOptions, ResponseType, SchedulerConfig,
    TelemetryConfig, UploadRequest,
};
use pixlift_worker::UploadScheduler;

#[derive(Parser, Debug)]
#[command(name = "pixlift-upload")]
#[command(about = "Upload files to an HTTP endpoint with bounded concurrency")]
struct Args {
    /// Destination URL
    #[arg(long)]
    url: String,

    /// HTTP method
    #[arg(long, default_value = "POST")]
    method: String,

    /// Form field, repeatable (NAME=VALUE)
    #[arg(long = "field", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,

    /// Request header, repeatable (NAME=VALUE)
    #[arg(long = "header", value_parser = parse_key_value)]
    headers: Vec<(String, String)>,

    /// Query parameter, repeatable (NAME=VALUE)
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Form field that carries the file
    #[arg(long, default_value = "file")]
    file_field: String,

    #[arg(long)]
    max_width: Option<u32>,

    #[arg(long)]
    max_height: Option<u32>,

    /// Re-encode quality, 0-100
    #[arg(long, default_value_t = 80)]
    quality: u8,

    /// Re-encode format: jpeg or png
    #[arg(long, default_value = "jpeg")]
    format: String,

    /// Also send image metadata as request headers
    #[arg(long)]
    metadata_headers: bool,

    /// Response type: text, json, arraybuffer, blob or document
    #[arg(long, default_value = "text")]
    response_type: String,

    /// Override PIXLIFT_MAX_CONCURRENT
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl Args {
    fn resize_options(&self) -> Result<Option<ResizeOptions>> {
        if self.max_width.is_none() && self.max_height.is_none() {
            return Ok(None);
        }
        let format = OutputFormat::parse(&self.format)
            .with_context(|| format!("unsupported output format: {}", self.format))?;
        Ok(Some(ResizeOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            ..ResizeOptions::default()
        }
        .with_quality(self.quality)
        .with_format(format)))
    }

    fn destination(&self) -> Destination {
        let mut destination = Destination::post(&self.url)
            .with_method(&self.method)
            .with_response_type(ResponseType::parse(&self.response_type));
        for (name, value) in &self.headers {
            destination = destination.with_header(name, value);
        }
        for (name, value) in &self.params {
            destination = destination.with_param(name, value);
        }
        destination
    }
}

#[derive(serde::Serialize)]
struct UploadReport {
    file: PathBuf,
    upload_id: String,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
enum Outcome {
    Response(pixlift_core::UploadResponse),
    Error { code: &'static str, message: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    pixlift_infra::init_tracing(&TelemetryConfig::from_env()?);

    let args = Args::parse();

    let mut config = SchedulerConfig::from_env()?;
    if let Some(max_concurrent) = args.max_concurrent {
        config = config.with_max_concurrent(max_concurrent);
    }
    let scheduler = UploadScheduler::new(config)?;

    let destination = args.destination();
    let fields = collect_fields(&args.fields);
    let resize = args.resize_options()?;
    let target = if args.metadata_headers {
        MetadataTarget::FieldsAndHeaders
    } else {
        MetadataTarget::Fields
    };

    let handles: Vec<_> = args
        .files
        .iter()
        .map(|file| {
            let mut request = UploadRequest::new(destination.clone(), file)
                .with_fields(fields.clone())
                .with_file_field_name(&args.file_field)
                .with_metadata_target(target);
            if let Some(options) = resize {
                request = request.with_resize(options);
            }
            (file.clone(), scheduler.submit(request))
        })
        .collect();
    scheduler.close();

    let mut failures = 0usize;
    for (file, handle) in handles {
        let upload_id = handle.upload_id().to_string();
        let outcome = match handle.await {
            Ok(response) => {
                if response.is_error() {
                    failures += 1;
                }
                Outcome::Response(response)
            }
            Err(e) => {
                failures += 1;
                Outcome::Error {
                    code: e.code(),
                    message: e.to_string(),
                }
            }
        };
        let report = UploadReport {
            file,
            upload_id,
            outcome,
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    tracing::info!(stats = ?scheduler.stats(), "All uploads finished");

    if failures > 0 {
        anyhow::bail!("{failures} upload(s) failed");
    }
    Ok(())
}
