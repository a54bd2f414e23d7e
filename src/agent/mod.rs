// Metric agents: periodic samplers exposing a cached value, state and rendering.

mod cpu;
mod disk;
mod load;
mod memory;
mod percent;
mod systime;
mod uptime;

pub use cpu::CpuUsageAgent;
pub use disk::{DiskStatAgent, DiskStatKind, Throughput};
pub use load::{LoadAverageAgent, LoadSpan};
pub use memory::{MemoryAgent, MemoryKind};
pub use percent::PercentGauge;
pub use systime::{DEFAULT_TIME_FORMAT, SystemTimeAgent};
pub use uptime::UptimeAgent;

use crate::classifier::{Severity, ThresholdBand};
use crate::error::{AgentError, Result};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// A periodic metric sampler.
///
/// The host calls [`Agent::refresh`] every [`Agent::sampling_period`] and never
/// overlaps two refreshes of the same agent. Reads may happen at any time and
/// see either the previous or the new sample, never a mix.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn label(&self) -> &str;

    fn summary(&self) -> &str;

    fn sampling_period(&self) -> Duration;

    /// Take a new reading. On error the previously cached value is kept.
    /// Returns the new state when a percent agent moved to a different band.
    fn refresh(&self) -> Result<Option<StateChange>>;

    /// Current value in the agent's unit.
    fn value(&self) -> f64;

    /// Current band of percent agents; `None` for plain agents or before the first refresh.
    fn state(&self) -> Option<AgentState> {
        None
    }

    /// Value formatted with two decimals and the unit suffix.
    fn render(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentState {
    pub tag: String,
    pub severity: Severity,
    pub label: String,
    pub summary: String,
}

impl From<&ThresholdBand> for AgentState {
    fn from(band: &ThresholdBand) -> Self {
        Self {
            tag: band.tag.clone(),
            severity: band.severity,
            label: band.label.clone(),
            summary: band.summary.clone(),
        }
    }
}

/// Emitted when a percent agent resolves to a band with a different tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub agent: String,
    pub previous: Option<String>,
    pub current: AgentState,
    pub value: f64,
}

/// Identity and schedule shared by every agent type.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    pub sampling_period: Duration,
    pub label: Option<String>,
    pub summary: Option<String>,
}

impl AgentSettings {
    pub fn new(name: impl Into<String>, sampling_period_secs: u32) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AgentError::config("agent name must be non-empty"));
        }
        if sampling_period_secs == 0 {
            return Err(AgentError::config(format!(
                "agent '{name}' requires an update timer (sampling_period_secs > 0)"
            )));
        }
        Ok(Self {
            name,
            sampling_period: Duration::from_secs(u64::from(sampling_period_secs)),
            label: None,
            summary: None,
        })
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|l| !l.is_empty());
        self
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.is_empty());
        self
    }

    pub fn sampling_period_secs(&self) -> u64 {
        self.sampling_period.as_secs()
    }
}

/// Cached sample slot, replaced whole on every successful refresh.
#[derive(Debug, Default)]
pub(crate) struct Cached<T>(RwLock<T>);

impl<T: Clone> Cached<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(RwLock::new(value))
    }

    pub(crate) fn get(&self) -> T {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Rejects NaN and infinities before they reach the cache.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AgentError::unavailable(
            what,
            format!("computed a non-finite value ({value})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_reject_zero_period_and_empty_name() {
        let err = AgentSettings::new("disk", 0).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("update timer"));
        assert!(AgentSettings::new("", 5).is_err());
        assert_eq!(AgentSettings::new("disk", 5).unwrap().sampling_period_secs(), 5);
    }

    #[test]
    fn empty_label_falls_back_to_default() {
        let settings = AgentSettings::new("disk", 5)
            .unwrap()
            .with_label(Some(String::new()))
            .with_summary(Some("custom".into()));
        assert_eq!(settings.label, None);
        assert_eq!(settings.summary.as_deref(), Some("custom"));
    }

    #[test]
    fn cached_slot_replaces_whole_value() {
        let slot = Cached::new((1.0, "a"));
        slot.set((2.0, "b"));
        assert_eq!(slot.get(), (2.0, "b"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(ensure_finite("x", f64::NAN).is_err());
        assert!(ensure_finite("x", f64::INFINITY).is_err());
        assert_eq!(ensure_finite("x", 1.5).unwrap(), 1.5);
    }
}
