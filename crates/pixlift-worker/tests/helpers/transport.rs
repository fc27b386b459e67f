use async_trait::async_trait;
use bytes::Bytes;
use pixlift_client::{RawResponse, TransferRequest, UploadTransport};
use pixlift_core::UploadError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    End(String),
}

/// In-memory transport that records the order transfers start and end.
#[derive(Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<Event>>,
    bodies: Mutex<HashMap<String, Bytes>>,
    calls: AtomicUsize,
    delay: Duration,
    failing: HashSet<String>,
    /// When set, every transfer waits for a permit before finishing.
    gate: Option<Arc<Semaphore>>,
}

impl RecordingTransport {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Transfers block until `release` is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn failing_for(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn release(&self, transfers: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(transfers);
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn started_ids(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Start(id) => Some(id),
                Event::End(_) => None,
            })
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn body(&self, upload_id: &str) -> Option<Bytes> {
        self.bodies.lock().unwrap().get(upload_id).cloned()
    }

    /// Poll until `count` transfers have started, for at most two seconds.
    pub async fn wait_for_starts(&self, count: usize) {
        for _ in 0..200 {
            if self.started_ids().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("only {} of {} transfers started", self.started_ids().len(), count);
    }

    /// Largest number of transfers that were between start and end at once.
    pub fn max_active(&self) -> usize {
        let mut active = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event {
                Event::Start(_) => {
                    active += 1;
                    max = max.max(active);
                }
                Event::End(_) => active -= 1,
            }
        }
        max
    }
}

#[async_trait]
impl UploadTransport for RecordingTransport {
    async fn send(&self, request: TransferRequest) -> Result<RawResponse, UploadError> {
        let id = request.upload_id.clone();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Start(id.clone()));
        self.bodies
            .lock()
            .unwrap()
            .insert(id.clone(), request.body.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.events.lock().unwrap().push(Event::End(id.clone()));

        if self.failing.contains(&id) {
            return Err(UploadError::Transport(format!("connection reset for {id}")));
        }
        Ok(RawResponse {
            status: 200,
            url: request.url,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: Bytes::from(format!("stored {id}")),
        })
    }
}
