//! Completion delivery
//!
//! Every submitted upload owns exactly one [`Completion`]. Delivering consumes
//! it, and dropping it undelivered reports [`UploadError::Abandoned`], so the
//! receiver always observes exactly one result.

use pixlift_core::{UploadError, UploadResult};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Callback = Box<dyn FnOnce(UploadResult) + Send + 'static>;

enum Sink {
    Channel(oneshot::Sender<UploadResult>),
    Callback(Callback),
}

impl Sink {
    fn send(self, result: UploadResult) {
        match self {
            // The handle may have been dropped; nobody is waiting then.
            Sink::Channel(tx) => {
                let _ = tx.send(result);
            }
            Sink::Callback(callback) => callback(result),
        }
    }
}

pub struct Completion {
    upload_id: String,
    sink: Option<Sink>,
}

impl Completion {
    /// Completion paired with an [`UploadHandle`] future.
    pub fn channel(upload_id: impl Into<String>) -> (Self, UploadHandle) {
        let upload_id = upload_id.into();
        let (tx, rx) = oneshot::channel();
        let handle = UploadHandle {
            upload_id: upload_id.clone(),
            receiver: rx,
        };
        (
            Self {
                upload_id,
                sink: Some(Sink::Channel(tx)),
            },
            handle,
        )
    }

    /// Completion that invokes `callback` with the result.
    pub fn callback<F>(upload_id: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(UploadResult) + Send + 'static,
    {
        Self {
            upload_id: upload_id.into(),
            sink: Some(Sink::Callback(Box::new(callback))),
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn deliver(mut self, result: UploadResult) {
        if let Some(sink) = self.sink.take() {
            sink.send(result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            tracing::warn!(upload_id = %self.upload_id, "Upload abandoned before completion");
            sink.send(Err(UploadError::Abandoned));
        }
    }
}

/// Resolves to the upload's result once the pipeline finishes.
#[derive(Debug)]
pub struct UploadHandle {
    upload_id: String,
    receiver: oneshot::Receiver<UploadResult>,
}

impl UploadHandle {
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }
}

impl Future for UploadHandle {
    type Output = UploadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(UploadError::Abandoned)))
    }
}
