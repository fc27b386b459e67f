//! Upload scheduler: bounded worker slots over an unbounded backlog.
//!
//! Each submission becomes a Tokio task that waits for a slot (a semaphore
//! permit) and then runs the upload pipeline while holding it. Submitting never
//! blocks. Cancellation only applies while an upload is still waiting; once it
//! holds a slot it runs to completion.
//!
//! Dropping the scheduler does not stop queued work. Shutting down the runtime
//! abandons it, and each abandoned upload reports [`UploadError::Abandoned`].

use anyhow::Context;
use pixlift_client::{ReqwestTransport, UploadTransport};
use pixlift_core::{SchedulerConfig, UploadError, UploadRequest, UploadResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::completion::{Completion, UploadHandle};
use crate::pipeline::run_pipeline;
use crate::stats::{Counters, SchedulerStats};

struct PendingUpload {
    upload_id: String,
    token: CancellationToken,
}

struct SchedulerInner {
    transport: Arc<dyn UploadTransport>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    temp_dir: PathBuf,
    runtime: Handle,
    /// Submitted uploads that have not claimed a slot, keyed by submission sequence.
    pending: Mutex<HashMap<u64, PendingUpload>>,
    next_seq: AtomicU64,
    counters: Counters,
    closed: AtomicBool,
}

impl SchedulerInner {
    fn pending(&self) -> MutexGuard<'_, HashMap<u64, PendingUpload>> {
        // The map stays consistent even if a holder panicked.
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(
        self: Arc<Self>,
        seq: u64,
        request: UploadRequest,
        token: CancellationToken,
        completion: Completion,
    ) {
        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok(),
        };

        // Claim the upload. Losing the race against `cancel` means it was cancelled.
        let claimed = self.pending().remove(&seq).is_some();
        let _permit = match permit {
            Some(permit) if claimed && !token.is_cancelled() => permit,
            _ => {
                tracing::info!(upload_id = %request.id, "Upload cancelled before start");
                self.counters.cancelled();
                completion.deliver(Err(UploadError::Cancelled));
                return;
            }
        };

        let (slot, in_flight) = self.counters.started();
        tracing::debug!(
            upload_id = %request.id,
            in_flight,
            max_concurrent = self.max_concurrent,
            "Upload claimed a worker slot"
        );

        let upload_id = request.id.clone();
        let result = run_pipeline(request, self.transport.as_ref(), self.temp_dir.clone()).await;

        match &result {
            Ok(response) => {
                self.counters.finished(true);
                if response.is_error() {
                    tracing::warn!(
                        upload_id = %upload_id,
                        status = response.status,
                        "Upload answered with error status"
                    );
                }
            }
            Err(e) => {
                self.counters.finished(false);
                tracing::error!(
                    upload_id = %upload_id,
                    error = %e,
                    code = e.code(),
                    "Upload failed"
                );
            }
        }

        drop(slot);
        completion.deliver(result);
    }
}

/// Bounded-concurrency upload scheduler.
///
/// Cheap to clone; clones share the same slots, backlog and transport.
#[derive(Clone)]
pub struct UploadScheduler {
    inner: Arc<SchedulerInner>,
}

impl UploadScheduler {
    /// Build a scheduler with a `reqwest` transport. Must be called inside a
    /// Tokio runtime; uploads run on that runtime.
    pub fn new(config: SchedulerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a scheduler around an existing transport.
    pub fn with_transport(
        config: SchedulerConfig,
        transport: Arc<dyn UploadTransport>,
    ) -> anyhow::Result<Self> {
        let runtime =
            Handle::try_current().context("UploadScheduler must be created inside a Tokio runtime")?;
        let max_concurrent = config.resolve_max_concurrent(pixlift_infra::recommended_concurrency);

        tracing::info!(
            max_concurrent,
            temp_dir = %config.temp_dir.display(),
            "Upload scheduler started"
        );

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                transport,
                semaphore: Arc::new(Semaphore::new(max_concurrent)),
                max_concurrent,
                temp_dir: config.temp_dir,
                runtime,
                pending: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                counters: Counters::default(),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Queue an upload. Returns immediately with a handle resolving to its result.
    pub fn submit(&self, request: UploadRequest) -> UploadHandle {
        let (completion, handle) = Completion::channel(request.id.clone());
        self.enqueue(request, completion);
        handle
    }

    /// Queue an upload whose result is passed to `callback` exactly once.
    ///
    /// After [`close`](Self::close) the callback runs on the caller's thread
    /// before this returns.
    pub fn submit_with_callback<F>(&self, request: UploadRequest, callback: F)
    where
        F: FnOnce(UploadResult) + Send + 'static,
    {
        let completion = Completion::callback(request.id.clone(), callback);
        self.enqueue(request, completion);
    }

    fn enqueue(&self, request: UploadRequest, completion: Completion) {
        let inner = &self.inner;

        if inner.closed.load(Ordering::SeqCst) {
            tracing::info!(upload_id = %request.id, "Scheduler closed, rejecting upload");
            inner.counters.cancelled();
            completion.deliver(Err(UploadError::Cancelled));
            return;
        }

        let seq = inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let queued = {
            let mut pending = inner.pending();
            pending.insert(
                seq,
                PendingUpload {
                    upload_id: request.id.clone(),
                    token: token.clone(),
                },
            );
            pending.len()
        };

        tracing::info!(
            upload_id = %request.id,
            queued,
            in_flight = inner.counters.in_flight.load(Ordering::SeqCst),
            "Upload queued"
        );

        inner
            .runtime
            .spawn(inner.clone().run(seq, request, token, completion));
    }

    /// Cancel every not-yet-started upload with this id. Each receives
    /// [`UploadError::Cancelled`]. Returns how many were cancelled; uploads that
    /// already hold a worker slot are not affected.
    pub fn cancel(&self, upload_id: &str) -> usize {
        let mut pending = self.inner.pending();
        let matching: Vec<u64> = pending
            .iter()
            .filter(|(_, upload)| upload.upload_id == upload_id)
            .map(|(seq, _)| *seq)
            .collect();

        for seq in &matching {
            if let Some(upload) = pending.remove(seq) {
                upload.token.cancel();
            }
        }

        if !matching.is_empty() {
            tracing::info!(upload_id = %upload_id, count = matching.len(), "Upload cancelled");
        }
        matching.len()
    }

    /// Stop accepting uploads. Later submissions complete immediately with
    /// [`UploadError::Cancelled`]; uploads already queued still run.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(queued = self.inner.pending().len(), "Upload scheduler closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    pub fn stats(&self) -> SchedulerStats {
        let queued = self.inner.pending().len();
        self.inner
            .counters
            .snapshot(self.inner.max_concurrent, queued)
    }
}

impl std::fmt::Debug for UploadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadScheduler")
            .field("stats", &self.stats())
            .field("closed", &self.is_closed())
            .finish()
    }
}
