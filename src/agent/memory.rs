// Memory and swap usage agents

use super::{Agent, AgentSettings, AgentState, PercentGauge, StateChange, ensure_finite};
use crate::classifier::BandTable;
use crate::error::Result;
use crate::source::CounterSource;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    Memory,
    Swap,
}

impl MemoryKind {
    fn label(self) -> &'static str {
        match self {
            Self::Memory => "Memory used",
            Self::Swap => "Swap used",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::Memory => "Percentage of used system memory",
            Self::Swap => "Percentage of used swap space",
        }
    }

    pub fn default_bands(self) -> Arc<BandTable> {
        match self {
            Self::Memory => BandTable::memory(),
            Self::Swap => BandTable::swap(),
        }
    }
}

pub struct MemoryAgent {
    settings: AgentSettings,
    label: String,
    summary: String,
    kind: MemoryKind,
    source: Arc<dyn CounterSource>,
    gauge: PercentGauge,
}

impl MemoryAgent {
    pub fn new(
        settings: AgentSettings,
        kind: MemoryKind,
        bands: Arc<BandTable>,
        source: Arc<dyn CounterSource>,
    ) -> Self {
        let label = settings.label.clone().unwrap_or_else(|| kind.label().into());
        let summary = settings
            .summary
            .clone()
            .unwrap_or_else(|| kind.summary().into());
        Self {
            settings,
            label,
            summary,
            kind,
            source,
            gauge: PercentGauge::new(bands),
        }
    }
}

impl Agent for MemoryAgent {
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
        let usage = self.source.memory()?;
        let ratio = match self.kind {
            MemoryKind::Memory => usage.memory_ratio(),
            MemoryKind::Swap => usage.swap_ratio(),
        };
        let ratio = ensure_finite("memory usage", ratio)?;
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
