// System load average agent (1, 5 or 15 minutes), normalized by core count.

use super::{Agent, AgentSettings, AgentState, PercentGauge, StateChange, ensure_finite};
use crate::classifier::BandTable;
use crate::error::{AgentError, Result};
use crate::models::LoadAverage;
use crate::source::CounterSource;
use std::sync::Arc;
use std::time::Duration;

/// Ceiling applied to the per-core load before caching.
const MAX_LOAD_RATIO: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSpan {
    One,
    Five,
    Fifteen,
}

impl LoadSpan {
    pub fn from_minutes(minutes: u64) -> Result<Self> {
        match minutes {
            1 => Ok(Self::One),
            5 => Ok(Self::Five),
            15 => Ok(Self::Fifteen),
            _ => Err(AgentError::config(format!(
                "load average span should be 1, 5 or 15 minutes, got {minutes}"
            ))),
        }
    }

    pub fn minutes(self) -> u64 {
        match self {
            Self::One => 1,
            Self::Five => 5,
            Self::Fifteen => 15,
        }
    }

    fn select(self, load: &LoadAverage) -> f64 {
        match self {
            Self::One => load.one,
            Self::Five => load.five,
            Self::Fifteen => load.fifteen,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::One => "System load in the last minute",
            Self::Five => "System load in the last 5 minutes",
            Self::Fifteen => "System load in the last 15 minutes",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::One => "Average system load in the last minute",
            Self::Five => "Average system load in the last five minutes",
            Self::Fifteen => "Average system load in the last fifteen minutes",
        }
    }
}

pub struct LoadAverageAgent {
    settings: AgentSettings,
    label: String,
    summary: String,
    span: LoadSpan,
    cores: u16,
    source: Arc<dyn CounterSource>,
    gauge: PercentGauge,
}

impl LoadAverageAgent {
    /// Reads the core count once; a missing or zero count aborts construction.
    pub fn new(
        settings: AgentSettings,
        span: LoadSpan,
        bands: Arc<BandTable>,
        source: Arc<dyn CounterSource>,
    ) -> Result<Self> {
        let cores = source.core_count()?;
        if cores == 0 {
            return Err(AgentError::config(format!(
                "agent '{}': core count must be > 0",
                settings.name
            )));
        }
        tracing::debug!(
            agent = %settings.name,
            minutes = span.minutes(),
            cores,
            "load average agent ready"
        );
        let label = settings.label.clone().unwrap_or_else(|| span.label().into());
        let summary = settings
            .summary
            .clone()
            .unwrap_or_else(|| span.summary().into());
        Ok(Self {
            settings,
            label,
            summary,
            span,
            cores,
            source,
            gauge: PercentGauge::new(bands),
        })
    }
}

impl Agent for LoadAverageAgent {
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
        let load = self.source.load_average()?;
        let ratio = (self.span.select(&load) / f64::from(self.cores)).min(MAX_LOAD_RATIO);
        let ratio = ensure_finite("system load average", ratio)?;
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
