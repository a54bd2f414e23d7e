// Disk read/write throughput agent

use super::{Agent, AgentSettings, Cached, StateChange, ensure_finite};
use crate::delta::CounterDeltaTracker;
use crate::error::{AgentError, Result};
use crate::models::DiskSnapshot;
use crate::source::CounterSource;
use crate::units::Unit;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatKind {
    Average,
    Read,
    Write,
}

impl DiskStatKind {
    fn label(self) -> &'static str {
        match self {
            Self::Average => "Average disk speed",
            Self::Read => "Read disk speed",
            Self::Write => "Write disk speed",
        }
    }

    fn select(self, read: f64, write: f64) -> f64 {
        match self {
            Self::Average => (read + write) / 2.0,
            Self::Read => read,
            Self::Write => write,
        }
    }
}

impl FromStr for DiskStatKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "average" => Ok(Self::Average),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(AgentError::config(format!(
                "unknown disk stat kind '{s}', expected average, read or write"
            ))),
        }
    }
}

/// Whether the agent reports bytes accumulated since start or the per-second
/// rate of the latest interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Throughput {
    #[default]
    Accumulated,
    PerSecond,
}

impl FromStr for Throughput {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accumulated" => Ok(Self::Accumulated),
            "per-second" => Ok(Self::PerSecond),
            _ => Err(AgentError::config(format!(
                "unknown throughput '{s}', expected accumulated or per-second"
            ))),
        }
    }
}

pub struct DiskStatAgent {
    settings: AgentSettings,
    label: String,
    kind: DiskStatKind,
    throughput: Throughput,
    unit: Unit,
    source: Arc<dyn CounterSource>,
    tracker: Mutex<CounterDeltaTracker>,
    value: Cached<f64>,
}

impl DiskStatAgent {
    /// Seeds the tracker from the current counters of all physical disks.
    pub fn new(
        settings: AgentSettings,
        kind: DiskStatKind,
        unit: Unit,
        throughput: Throughput,
        source: Arc<dyn CounterSource>,
    ) -> Result<Self> {
        let initial = Self::snapshot(source.as_ref())?;
        let label = settings
            .label
            .clone()
            .unwrap_or_else(|| format!("{} in {}", kind.label(), unit.speed()));
        tracing::debug!(
            agent = %settings.name,
            devices = initial.devices.len(),
            "disk counters seeded"
        );
        Ok(Self {
            settings,
            label,
            kind,
            throughput,
            unit,
            source,
            tracker: Mutex::new(CounterDeltaTracker::new(initial)),
            value: Cached::new(0.0),
        })
    }

    fn snapshot(source: &dyn CounterSource) -> Result<DiskSnapshot> {
        let devices = source.disk_counters()?;
        Ok(DiskSnapshot::new(devices, source.now()))
    }
}

impl Agent for DiskStatAgent {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn summary(&self) -> &str {
        self.settings.summary.as_deref().unwrap_or("")
    }

    fn sampling_period(&self) -> Duration {
        self.settings.sampling_period
    }

    fn refresh(&self) -> Result<Option<StateChange>> {
        let current = Self::snapshot(self.source.as_ref())?;

        let mut tracker = self.tracker.lock().unwrap_or_else(PoisonError::into_inner);
        tracker.update(current);
        let (read, write) = match self.throughput {
            Throughput::Accumulated => (tracker.read(), tracker.write()),
            Throughput::PerSecond => (tracker.read_rate(), tracker.write_rate()),
        };
        drop(tracker);

        let (scaled, _) = self.unit.convert(self.kind.select(read, write));
        self.value.set(ensure_finite("disk throughput", scaled)?);
        tracing::trace!(agent = %self.settings.name, read, write, "disk stats refreshed");
        Ok(None)
    }

    fn value(&self) -> f64 {
        self.value.get()
    }

    fn render(&self) -> String {
        format!("{:.2} {}", self.value(), self.unit.speed())
    }
}
