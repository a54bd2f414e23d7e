// Cumulative disk counter tracking: per-device deltas between snapshots, running totals.

use crate::models::DiskSnapshot;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Baseline {
    read_bytes: u64,
    write_bytes: u64,
}

impl Baseline {
    fn from_counters(read_bytes: u64, write_bytes: u64) -> Self {
        Self {
            read_bytes,
            write_bytes,
        }
    }
}

/// Running read/write totals built from successive counter snapshots.
///
/// Each device keeps its own baseline, keyed by device name. The totals are
/// the sum of per-device growth since construction, never the raw OS counters:
/// - a counter that goes backwards (reset) contributes nothing for that step;
/// - a device seen for the first time is seeded, its existing bytes are not counted;
/// - a device missing from a snapshot is forgotten, and seeded again if it returns.
///
/// Totals therefore never decrease, and one incomplete snapshot only loses the
/// growth of the devices it is missing.
#[derive(Debug, Clone)]
pub struct CounterDeltaTracker {
    baselines: HashMap<String, Baseline>,
    last_at: Instant,
    read: f64,
    write: f64,
    read_rate: f64,
    write_rate: f64,
}

impl CounterDeltaTracker {
    pub fn new(initial: DiskSnapshot) -> Self {
        let baselines = initial
            .devices
            .into_iter()
            .map(|d| (d.device, Baseline::from_counters(d.read_bytes, d.write_bytes)))
            .collect();
        Self {
            baselines,
            last_at: initial.taken_at,
            read: 0.0,
            write: 0.0,
            read_rate: 0.0,
            write_rate: 0.0,
        }
    }

    pub fn update(&mut self, current: DiskSnapshot) {
        let taken_at = current.taken_at;
        let Step {
            baselines,
            read: delta_read,
            write: delta_write,
        } = self.rebase(current);
        self.baselines = baselines;

        self.read += delta_read as f64;
        self.write += delta_write as f64;

        let elapsed = taken_at.saturating_duration_since(self.last_at).as_secs_f64();
        if elapsed > 0.0 {
            self.read_rate = delta_read as f64 / elapsed;
            self.write_rate = delta_write as f64 / elapsed;
        } else {
            self.read_rate = 0.0;
            self.write_rate = 0.0;
        }
        self.last_at = taken_at;
    }

    /// Compares `current` against the stored baselines and returns the new
    /// baselines with the summed clamped growth.
    fn rebase(&self, current: DiskSnapshot) -> Step {
        let mut step = Step {
            baselines: HashMap::with_capacity(current.devices.len()),
            read: 0,
            write: 0,
        };
        for device in current.devices {
            match self.baselines.get(&device.device) {
                Some(previous) => {
                    if device.read_bytes < previous.read_bytes
                        || device.write_bytes < previous.write_bytes
                    {
                        tracing::trace!(
                            device = %device.device,
                            previous_read = previous.read_bytes,
                            current_read = device.read_bytes,
                            previous_write = previous.write_bytes,
                            current_write = device.write_bytes,
                            "disk counter regression clamped"
                        );
                    }
                    step.read = step
                        .read
                        .saturating_add(clamped_delta(previous.read_bytes, device.read_bytes));
                    step.write = step
                        .write
                        .saturating_add(clamped_delta(previous.write_bytes, device.write_bytes));
                }
                None => {
                    tracing::debug!(device = %device.device, "new disk device seeded");
                }
            }
            step.baselines.insert(
                device.device,
                Baseline::from_counters(device.read_bytes, device.write_bytes),
            );
        }
        for gone in self.baselines.keys().filter(|d| !step.baselines.contains_key(*d)) {
            tracing::debug!(device = %gone, "disk device missing from sample, baseline dropped");
        }
        step
    }

    /// Bytes read since construction.
    pub fn read(&self) -> f64 {
        self.read
    }

    /// Bytes written since construction.
    pub fn write(&self) -> f64 {
        self.write
    }

    /// Bytes/second read over the latest interval.
    pub fn read_rate(&self) -> f64 {
        self.read_rate
    }

    /// Bytes/second written over the latest interval.
    pub fn write_rate(&self) -> f64 {
        self.write_rate
    }
}

struct Step {
    baselines: HashMap<String, Baseline>,
    read: u64,
    write: u64,
}

/// Growth of a cumulative counter; a counter that went backwards yields 0.
pub(crate) fn clamped_delta(previous: u64, current: u64) -> u64 {
    current.saturating_sub(previous)
}
