// Load average and memory models

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Memory and swap totals in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub total_memory: u64,
    pub used_memory: u64,
    pub total_swap: u64,
    pub used_swap: u64,
}

impl MemoryUsage {
    pub fn memory_ratio(&self) -> f64 {
        ratio(self.used_memory, self.total_memory)
    }

    pub fn swap_ratio(&self) -> f64 {
        ratio(self.used_swap, self.total_swap)
    }
}

fn ratio(used: u64, total: u64) -> f64 {
    if total > 0 {
        used.min(total) as f64 / total as f64
    } else {
        0.0
    }
}
