use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Point-in-time view of a scheduler, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SchedulerStats {
    pub max_concurrent: usize,
    /// Submitted, not yet started.
    pub queued: usize,
    /// Holding a worker slot.
    pub in_flight: usize,
    /// Transfers that got a response (any status).
    pub completed: u64,
    pub cancelled: u64,
    /// Encoding, transport and request errors.
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub in_flight: AtomicUsize,
    pub completed: AtomicU64,
    pub cancelled: AtomicU64,
    pub failed: AtomicU64,
}

/// Occupies one `in_flight` slot until dropped, including when the upload
/// future is dropped mid-flight.
#[derive(Debug)]
pub(crate) struct InFlight<'a> {
    counters: &'a Counters,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Counters {
    /// Mark an upload as running. Returns the guard and the new in-flight count.
    pub fn started(&self) -> (InFlight<'_>, usize) {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        (InFlight { counters: self }, in_flight)
    }

    /// Record how a running upload ended. Its [`InFlight`] guard releases the slot.
    pub fn finished(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, max_concurrent: usize, queued: usize) -> SchedulerStats {
        SchedulerStats {
            max_concurrent,
            queued,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
