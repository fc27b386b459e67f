//! Capacity probing
//!
//! Derives a default worker budget from total host memory so small devices do
//! not decode several large images at once.

use sysinfo::System;

const MIB: u64 = 1024 * 1024;
const LOW_MEMORY_BYTES: u64 = 256 * MIB;
const MEDIUM_MEMORY_BYTES: u64 = 512 * MIB;

/// Worker slots for a host with `total_memory_bytes` of memory:
/// up to 256 MiB gives 1, up to 512 MiB gives 2, anything larger gives 3.
pub fn concurrency_for_memory(total_memory_bytes: u64) -> usize {
    if total_memory_bytes <= LOW_MEMORY_BYTES {
        1
    } else if total_memory_bytes <= MEDIUM_MEMORY_BYTES {
        2
    } else {
        3
    }
}

/// Worker slots recommended for the current host.
pub fn recommended_concurrency() -> usize {
    let mut system = System::new();
    system.refresh_memory();
    let total_memory = system.total_memory();

    let recommended = if total_memory == 0 {
        // Memory could not be read on this platform
        concurrency_for_memory(u64::MAX)
    } else {
        concurrency_for_memory(total_memory)
    };

    tracing::debug!(
        total_memory_mb = total_memory / MIB,
        recommended,
        "Recommended upload concurrency"
    );
    recommended
}
