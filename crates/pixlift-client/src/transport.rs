use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use pixlift_core::{Destination, SchedulerConfig, UploadError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use std::time::Instant;

use crate::response::RawResponse;

/// One fully-built HTTP transfer. Owns its body.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Correlation id, used only for logging.
    pub upload_id: String,
    pub method: String,
    pub url: String,
    pub params: Vec<(String, String)>,
    /// Caller headers followed by any injected metadata headers.
    pub headers: Vec<(String, String)>,
    /// Always replaces any caller-supplied `Content-Type`.
    pub content_type: String,
    pub body: Bytes,
}

impl TransferRequest {
    pub fn new(
        upload_id: impl Into<String>,
        destination: &Destination,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            method: destination.method.clone(),
            url: destination.url.clone(),
            params: destination.params.clone(),
            headers: destination.headers.clone(),
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Parsed method, with the query parameters appended to the URL.
    pub fn resolve(&self) -> Result<(Method, Url), UploadError> {
        let method = Method::from_bytes(self.method.to_uppercase().as_bytes())
            .map_err(|_| UploadError::InvalidRequest(format!("Invalid HTTP method: {}", self.method)))?;

        let mut url = Url::parse(&self.url)
            .map_err(|e| UploadError::InvalidRequest(format!("Invalid URL {}: {}", self.url, e)))?;
        if !self.params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.params {
                query.append_pair(name, value);
            }
        }

        Ok((method, url))
    }

    pub fn header_map(&self) -> Result<HeaderMap, UploadError> {
        let mut headers = HeaderMap::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| UploadError::InvalidRequest(format!("Invalid header name: {name}")))?;
            if name == CONTENT_TYPE {
                continue;
            }
            let value = HeaderValue::from_str(value).map_err(|_| {
                UploadError::InvalidRequest(format!("Invalid value for header {name}"))
            })?;
            headers.append(name, value);
        }

        let content_type = HeaderValue::from_str(&self.content_type).map_err(|_| {
            UploadError::InvalidRequest(format!("Invalid content type: {}", self.content_type))
        })?;
        headers.insert(CONTENT_TYPE, content_type);

        Ok(headers)
    }
}

/// Network transport shared by all uploads of a scheduler.
///
/// Implementations must be safe for concurrent use and must not keep
/// per-request state between calls.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(&self, request: TransferRequest) -> Result<RawResponse, UploadError>;
}

/// `reqwest`-backed transport with fixed timeouts and a pooled connection set.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &SchedulerConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.request_timeout)
            .timeout(config.resource_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn transport_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Transport(format!("Request timed out: {err}"))
    } else if err.is_connect() {
        UploadError::Transport(format!("Connection failed: {err}"))
    } else {
        UploadError::transport(err)
    }
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

#[async_trait]
impl UploadTransport for ReqwestTransport {
    #[tracing::instrument(
        skip(self, request),
        fields(upload_id = %request.upload_id, body_len = request.body.len())
    )]
    async fn send(&self, request: TransferRequest) -> Result<RawResponse, UploadError> {
        let (method, url) = request.resolve()?;
        let headers = request.header_map()?;
        let started = Instant::now();

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(transport_error)?;

        tracing::debug!(
            status,
            response_len = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transfer finished"
        );

        Ok(RawResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}
