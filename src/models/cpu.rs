// Aggregate CPU time counters

use serde::Serialize;

/// Cumulative clock ticks of all CPUs, split into busy and idle time.
///
/// `idle` includes I/O wait; `busy` is user, nice, system, irq, softirq and steal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CpuTicks {
    pub busy: u64,
    pub idle: u64,
}
