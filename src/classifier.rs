// Threshold classification: ordered severity bands keyed by an upper-bound fraction.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ready,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ready => write!(f, "ready"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ready" => Ok(Severity::Ready),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub upper_bound: f64,
    pub tag: String,
    pub severity: Severity,
    pub label: String,
    #[serde(default)]
    pub summary: String,
}

impl ThresholdBand {
    pub fn new(
        upper_bound: f64,
        tag: impl Into<String>,
        severity: Severity,
        label: impl Into<String>,
    ) -> Self {
        Self {
            upper_bound,
            tag: tag.into(),
            severity,
            label: label.into(),
            summary: String::new(),
        }
    }
}

/// Validated, immutable band sequence: bounds strictly increasing, last bound 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bands: Vec<ThresholdBand>,
}

impl BandTable {
    pub fn new(bands: Vec<ThresholdBand>) -> Result<Self> {
        let Some(last) = bands.last() else {
            return Err(AgentError::config("band table must not be empty"));
        };
        if last.upper_bound != 1.0 {
            return Err(AgentError::config(format!(
                "last band '{}' must have upper bound 1.0, got {}",
                last.tag, last.upper_bound
            )));
        }
        let mut previous = 0.0;
        for band in &bands {
            if band.tag.is_empty() {
                return Err(AgentError::config("band tag must be non-empty"));
            }
            if !(band.upper_bound > previous && band.upper_bound <= 1.0) {
                return Err(AgentError::config(format!(
                    "band '{}' upper bound {} must be in ({previous}, 1.0]",
                    band.tag, band.upper_bound
                )));
            }
            previous = band.upper_bound;
        }
        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }

    pub fn classify(&self, value: f64) -> &ThresholdBand {
        classify(value, self)
    }

    pub fn load_average() -> Arc<Self> {
        Arc::new(Self {
            bands: vec![
                ThresholdBand::new(0.5, "good", Severity::Ready, "System load is lower than 50%"),
                ThresholdBand::new(0.8, "gt50", Severity::Warning, "System load is higher than 50%"),
                ThresholdBand::new(0.95, "gt90", Severity::Error, "System load is higher than 80%"),
                ThresholdBand::new(1.0, "full", Severity::Critical, "System load is too high"),
            ],
        })
    }

    pub fn cpu() -> Arc<Self> {
        Arc::new(Self {
            bands: vec![
                ThresholdBand::new(0.5, "good", Severity::Ready, "CPU usage is lower than 50%"),
                ThresholdBand::new(0.8, "gt50", Severity::Warning, "CPU usage is higher than 50%"),
                ThresholdBand::new(0.95, "gt80", Severity::Error, "CPU usage is higher than 80%"),
                ThresholdBand::new(1.0, "full", Severity::Critical, "CPU is saturated"),
            ],
        })
    }

    pub fn memory() -> Arc<Self> {
        Arc::new(Self {
            bands: vec![
                ThresholdBand::new(0.7, "good", Severity::Ready, "Memory usage is lower than 70%"),
                ThresholdBand::new(0.9, "gt70", Severity::Warning, "Memory usage is higher than 70%"),
                ThresholdBand::new(0.97, "gt90", Severity::Error, "Memory usage is higher than 90%"),
                ThresholdBand::new(1.0, "full", Severity::Critical, "Memory is full"),
            ],
        })
    }

    pub fn swap() -> Arc<Self> {
        Arc::new(Self {
            bands: vec![
                ThresholdBand::new(0.5, "good", Severity::Ready, "Swap usage is lower than 50%"),
                ThresholdBand::new(0.75, "gt50", Severity::Warning, "Swap usage is higher than 50%"),
                ThresholdBand::new(0.9, "gt75", Severity::Error, "Swap usage is higher than 75%"),
                ThresholdBand::new(1.0, "full", Severity::Critical, "Swap is full"),
            ],
        })
    }
}

/// Returns the first band whose upper bound is >= `value`.
///
/// `value` is clamped into [0, 1] first (NaN counts as 0). The table always
/// ends at 1.0, so a band is always found.
pub fn classify(value: f64, table: &BandTable) -> &ThresholdBand {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    let ceiling = &table.bands[table.bands.len() - 1];
    table
        .bands
        .iter()
        .find(|band| band.upper_bound >= value)
        .unwrap_or(ceiling)
}
