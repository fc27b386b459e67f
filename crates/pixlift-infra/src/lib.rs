//! Pixlift infrastructure
//!
//! Process-level concerns kept out of the upload path: tracing subscriber
//! installation and, with the `capacity` feature, sizing the worker pool from
//! host memory.

pub mod telemetry;

#[cfg(feature = "capacity")]
pub mod capacity;

pub use telemetry::init_tracing;

#[cfg(feature = "capacity")]
pub use capacity::{concurrency_for_memory, recommended_concurrency};
