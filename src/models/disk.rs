// Disk I/O counter models

use serde::Serialize;
use std::time::Instant;

/// Cumulative byte counters of one physical block device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskCounters {
    pub device: String,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Per-device counters read together, stamped with a monotonic instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSnapshot {
    pub devices: Vec<DiskCounters>,
    pub taken_at: Instant,
}

impl DiskSnapshot {
    pub fn new(devices: Vec<DiskCounters>, taken_at: Instant) -> Self {
        Self { devices, taken_at }
    }
}
