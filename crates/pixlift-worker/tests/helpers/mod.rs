pub mod fixtures;
pub mod transport;

use pixlift_core::{Destination, SchedulerConfig, UploadRequest};
use std::path::Path;

pub const TEST_URL: &str = "https://uploads.test/upload";

pub fn config(max_concurrent: usize, temp_dir: &Path) -> SchedulerConfig {
    SchedulerConfig {
        temp_dir: temp_dir.to_path_buf(),
        ..SchedulerConfig::default()
    }
    .with_max_concurrent(max_concurrent)
}

pub fn request(id: &str, source: &Path) -> UploadRequest {
    UploadRequest::new(Destination::post(TEST_URL), source).with_id(id)
}
