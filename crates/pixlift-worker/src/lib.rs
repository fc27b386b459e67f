//! Pixlift worker
//!
//! Runs uploads through a fixed number of worker slots. Each upload is
//! resized (or measured), encoded as `multipart/form-data` and sent over the
//! shared transport; its caller receives exactly one result.

pub mod completion;
pub mod pipeline;
pub mod scheduler;
pub mod stats;

pub use completion::{Completion, UploadHandle};
pub use pipeline::{prepare_body, run_pipeline, PreparedBody};
pub use scheduler::UploadScheduler;
pub use stats::SchedulerStats;
