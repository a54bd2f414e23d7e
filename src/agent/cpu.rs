// CPU usage agent: busy share of CPU ticks between two samples

use super::{Agent, AgentSettings, AgentState, PercentGauge, StateChange, ensure_finite};
use crate::classifier::BandTable;
use crate::delta::clamped_delta;
use crate::error::Result;
use crate::models::CpuTicks;
use crate::source::CounterSource;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub struct CpuUsageAgent {
    settings: AgentSettings,
    label: String,
    summary: String,
    source: Arc<dyn CounterSource>,
    previous: Mutex<CpuTicks>,
    gauge: PercentGauge,
}

impl CpuUsageAgent {
    /// Seeds the tick baseline; fails when the counters cannot be read.
    pub fn new(
        settings: AgentSettings,
        bands: Arc<BandTable>,
        source: Arc<dyn CounterSource>,
    ) -> Result<Self> {
        let initial = source.cpu_ticks()?;
        let label = settings.label.clone().unwrap_or_else(|| "CPU usage".into());
        let summary = settings
            .summary
            .clone()
            .unwrap_or_else(|| "Share of CPU time spent outside idle".into());
        Ok(Self {
            settings,
            label,
            summary,
            source,
            previous: Mutex::new(initial),
            gauge: PercentGauge::new(bands),
        })
    }
}

impl Agent for CpuUsageAgent {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn summary(&self) -> &str {
        &self.summary
    }

    fn sampling_period(&self) -> Duration {
        self.settings.sampling_period
    }

    fn refresh(&self) -> Result<Option<StateChange>> {
        let current = self.source.cpu_ticks()?;

        let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
        let busy = clamped_delta(previous.busy, current.busy);
        let idle = clamped_delta(previous.idle, current.idle);
        *previous = current;
        drop(previous);

        let total = busy.saturating_add(idle);
        if total == 0 {
            // no ticks elapsed since the last sample
            tracing::trace!(agent = %self.settings.name, "no cpu ticks elapsed");
            return Ok(None);
        }
        let ratio = ensure_finite("cpu usage", busy as f64 / total as f64)?;
        Ok(self.gauge.publish(&self.settings.name, ratio))
    }

    fn value(&self) -> f64 {
        self.gauge.value()
    }

    fn state(&self) -> Option<AgentState> {
        self.gauge.state()
    }

    fn render(&self) -> String {
        self.gauge.render()
    }
}
