// Percent-style value holder: caches a 0..1 reading together with its resolved band.

use super::{AgentState, Cached, StateChange};
use crate::classifier::{BandTable, ThresholdBand};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct PercentSample {
    value: f64,
    band: ThresholdBand,
}

/// Classifies each new reading against an injected band table and keeps the
/// last (value, band) pair for readers.
#[derive(Debug)]
pub struct PercentGauge {
    bands: Arc<BandTable>,
    sample: Cached<Option<PercentSample>>,
}

impl PercentGauge {
    pub fn new(bands: Arc<BandTable>) -> Self {
        Self {
            bands,
            sample: Cached::new(None),
        }
    }

    /// Store a new reading. Returns a [`StateChange`] when the band tag differs
    /// from the previous one (including the very first reading).
    pub fn publish(&self, agent: &str, value: f64) -> Option<StateChange> {
        let band = self.bands.classify(value).clone();
        let previous = self.sample.get().map(|s| s.band.tag);
        let changed = previous.as_deref() != Some(band.tag.as_str());
        let current = AgentState::from(&band);

        self.sample.set(Some(PercentSample { value, band }));

        changed.then(|| StateChange {
            agent: agent.to_string(),
            previous,
            current,
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.sample.get().map_or(0.0, |s| s.value)
    }

    pub fn state(&self) -> Option<AgentState> {
        self.sample.get().map(|s| AgentState::from(&s.band))
    }

    pub fn render(&self) -> String {
        format!("{:.2}%", self.value() * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Severity;

    #[test]
    fn first_reading_reports_initial_state() {
        let gauge = PercentGauge::new(BandTable::load_average());
        assert_eq!(gauge.value(), 0.0);
        assert!(gauge.state().is_none());

        let change = gauge.publish("load", 0.125).expect("initial state");
        assert_eq!(change.previous, None);
        assert_eq!(change.current.tag, "good");
        assert_eq!(change.current.severity, Severity::Ready);
        assert_eq!(gauge.render(), "12.50%");
    }

    #[test]
    fn only_tag_transitions_are_reported() {
        let gauge = PercentGauge::new(BandTable::load_average());
        gauge.publish("load", 0.1);
        assert!(gauge.publish("load", 0.4).is_none());

        let change = gauge.publish("load", 0.85).expect("good -> gt90");
        assert_eq!(change.previous.as_deref(), Some("good"));
        assert_eq!(change.current.tag, "gt90");
        assert_eq!(change.value, 0.85);

        // no hysteresis: dropping straight back is allowed
        let change = gauge.publish("load", 0.2).expect("gt90 -> good");
        assert_eq!(change.current.tag, "good");
    }

    #[test]
    fn value_above_one_is_kept_but_classified_as_ceiling() {
        let gauge = PercentGauge::new(BandTable::load_average());
        gauge.publish("load", 2.5);
        assert_eq!(gauge.value(), 2.5);
        assert_eq!(gauge.state().unwrap().tag, "full");
    }
}
