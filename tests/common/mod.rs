// Shared test helpers: a scriptable counter source
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use sysagents::error::{AgentError, Result};
use sysagents::models::{CpuTicks, DiskCounters, LoadAverage, MemoryUsage};
use sysagents::source::CounterSource;

pub struct FakeSource {
    disks: Mutex<Vec<DiskCounters>>,
    load: Mutex<LoadAverage>,
    cores: Mutex<Option<u16>>,
    memory: Mutex<MemoryUsage>,
    uptime: Mutex<Duration>,
    cpu: Mutex<CpuTicks>,
    time: Mutex<DateTime<Utc>>,
    clock: Mutex<Instant>,
    failing: AtomicBool,
    pub disk_reads: AtomicUsize,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(vec![]),
            load: Mutex::new(LoadAverage {
                one: 0.0,
                five: 0.0,
                fifteen: 0.0,
            }),
            cores: Mutex::new(Some(4)),
            memory: Mutex::new(MemoryUsage {
                total_memory: 0,
                used_memory: 0,
                total_swap: 0,
                used_swap: 0,
            }),
            uptime: Mutex::new(Duration::ZERO),
            cpu: Mutex::new(CpuTicks::default()),
            time: Mutex::new(DateTime::<Utc>::UNIX_EPOCH),
            clock: Mutex::new(Instant::now()),
            failing: AtomicBool::new(false),
            disk_reads: AtomicUsize::new(0),
        }
    }

    /// Single physical disk with the given cumulative counters.
    pub fn set_disk(&self, read_bytes: u64, write_bytes: u64) {
        self.set_disks(&[("sda", read_bytes, write_bytes)]);
    }

    pub fn set_disks(&self, disks: &[(&str, u64, u64)]) {
        *self.disks.lock().unwrap() = disks
            .iter()
            .map(|(name, read_bytes, write_bytes)| DiskCounters {
                device: name.to_string(),
                read_bytes: *read_bytes,
                write_bytes: *write_bytes,
            })
            .collect();
    }

    pub fn set_load(&self, one: f64, five: f64, fifteen: f64) {
        *self.load.lock().unwrap() = LoadAverage { one, five, fifteen };
    }

    /// `None` makes the core count unreadable.
    pub fn set_cores(&self, cores: Option<u16>) {
        *self.cores.lock().unwrap() = cores;
    }

    pub fn set_memory(&self, memory: MemoryUsage) {
        *self.memory.lock().unwrap() = memory;
    }

    pub fn set_uptime(&self, uptime: Duration) {
        *self.uptime.lock().unwrap() = uptime;
    }

    pub fn set_cpu(&self, busy: u64, idle: u64) {
        *self.cpu.lock().unwrap() = CpuTicks { busy, idle };
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.time.lock().unwrap() = time;
    }

    /// Moves the sample clock forward; it never moves on its own.
    pub fn advance(&self, by: Duration) {
        *self.clock.lock().unwrap() += by;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, what: &'static str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AgentError::unavailable(what, "simulated read failure"))
        } else {
            Ok(())
        }
    }
}

impl CounterSource for FakeSource {
    fn disk_counters(&self) -> Result<Vec<DiskCounters>> {
        self.check("disk counters")?;
        self.disk_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.disks.lock().unwrap().clone())
    }

    fn load_average(&self) -> Result<LoadAverage> {
        self.check("load average")?;
        Ok(*self.load.lock().unwrap())
    }

    fn core_count(&self) -> Result<u16> {
        (*self.cores.lock().unwrap())
            .ok_or_else(|| AgentError::unavailable("cpu core count", "cpuinfo unreadable"))
    }

    fn memory(&self) -> Result<MemoryUsage> {
        self.check("memory")?;
        Ok(*self.memory.lock().unwrap())
    }

    fn uptime(&self) -> Result<Duration> {
        self.check("uptime")?;
        Ok(*self.uptime.lock().unwrap())
    }

    fn cpu_ticks(&self) -> Result<CpuTicks> {
        self.check("cpu ticks")?;
        Ok(*self.cpu.lock().unwrap())
    }

    fn system_time(&self) -> Result<DateTime<Utc>> {
        self.check("system time")?;
        Ok(*self.time.lock().unwrap())
    }

    fn now(&self) -> Instant {
        *self.clock.lock().unwrap()
    }
}
