// Raw counter source: point-in-time OS readings via sysinfo and /proc

mod linux;

use crate::error::{AgentError, Result};
use crate::models::{CpuTicks, DiskCounters, LoadAverage, MemoryUsage};
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(not(target_os = "linux"))]
use sysinfo::Disks;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::instrument;

/// Supplies raw counter readings to the agents.
///
/// Every call returns a fresh reading; implementations must be callable from
/// several agent refreshes at once.
pub trait CounterSource: Send + Sync {
    /// Cumulative read/write byte counters of every physical (non-virtual, non-partition) disk.
    fn disk_counters(&self) -> Result<Vec<DiskCounters>>;

    fn load_average(&self) -> Result<LoadAverage>;

    /// Number of CPU cores used to normalize the load average.
    fn core_count(&self) -> Result<u16>;

    fn memory(&self) -> Result<MemoryUsage>;

    fn uptime(&self) -> Result<Duration>;

    /// Cumulative busy/idle ticks of all CPUs.
    fn cpu_ticks(&self) -> Result<CpuTicks>;

    /// Wall-clock time of the system.
    fn system_time(&self) -> Result<DateTime<Utc>>;

    /// Monotonic instant stamped on counter samples, used for rates.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Production source backed by sysinfo, with Linux /proc readers where sysinfo
/// has no per-device view.
pub struct SysinfoSource {
    sys: Mutex<System>,
    #[cfg(not(target_os = "linux"))]
    disks: Mutex<Disks>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            sys: Mutex::new(sys),
            #[cfg(not(target_os = "linux"))]
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl CounterSource for SysinfoSource {
    #[instrument(skip(self), fields(source = "sysinfo", operation = "disk_counters"))]
    fn disk_counters(&self) -> Result<Vec<DiskCounters>> {
        #[cfg(target_os = "linux")]
        {
            linux::read_disk_counters_linux()
                .map_err(|e| AgentError::unavailable("/proc/diskstats", e))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let mut disks = self
                .disks
                .lock()
                .map_err(|e| AgentError::unavailable("disk list", e.to_string()))?;
            disks.refresh(true);
            Ok(disks
                .list()
                .iter()
                .map(|d| {
                    let usage = d.usage();
                    DiskCounters {
                        device: d.name().to_string_lossy().into_owned(),
                        read_bytes: usage.total_read_bytes,
                        write_bytes: usage.total_written_bytes,
                    }
                })
                .collect())
        }
    }

    #[instrument(skip(self), fields(source = "sysinfo", operation = "load_average"))]
    fn load_average(&self) -> Result<LoadAverage> {
        let load = System::load_average();
        let reading = LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        };
        if [reading.one, reading.five, reading.fifteen]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(AgentError::unavailable(
                "system load average",
                format!("invalid reading {reading:?}"),
            ));
        }
        Ok(reading)
    }

    #[instrument(skip(self), fields(source = "sysinfo", operation = "core_count"))]
    fn core_count(&self) -> Result<u16> {
        let cores = match linux::read_core_count_linux() {
            Some(cores) => cores,
            None => {
                let mut sys = self
                    .sys
                    .lock()
                    .map_err(|e| AgentError::unavailable("cpu list", e.to_string()))?;
                sys.refresh_cpu_list(CpuRefreshKind::nothing());
                sys.cpus().len()
            }
        };
        if cores == 0 {
            return Err(AgentError::unavailable("cpu core count", "no cores reported"));
        }
        tracing::info!(cores, "Number of CPU cores");
        Ok(u16::try_from(cores).unwrap_or(u16::MAX))
    }

    #[instrument(skip(self), fields(source = "sysinfo", operation = "memory"))]
    fn memory(&self) -> Result<MemoryUsage> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|e| AgentError::unavailable("memory", e.to_string()))?;
        sys.refresh_memory();
        let total_memory = sys.total_memory();
        if total_memory == 0 {
            return Err(AgentError::unavailable("memory", "total memory reported as 0"));
        }
        Ok(MemoryUsage {
            total_memory,
            used_memory: total_memory.saturating_sub(sys.available_memory()),
            total_swap: sys.total_swap(),
            used_swap: sys.used_swap(),
        })
    }

    fn uptime(&self) -> Result<Duration> {
        Ok(Duration::from_secs(System::uptime()))
    }

    #[instrument(skip(self), fields(source = "procfs", operation = "cpu_ticks"))]
    fn cpu_ticks(&self) -> Result<CpuTicks> {
        #[cfg(target_os = "linux")]
        {
            linux::read_cpu_ticks_linux().map_err(|e| AgentError::unavailable("/proc/stat", e))
        }
        #[cfg(not(target_os = "linux"))]
        {
            Err(AgentError::unavailable(
                "cpu ticks",
                "aggregate cpu tick counters are only read from /proc/stat",
            ))
        }
    }

    fn system_time(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now())
    }
}
