// Unit conversion for throughput agents

use crate::error::{AgentError, Result};

/// Divisor plus display suffix applied to a raw byte magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    value: f64,
    speed: String,
}

const KIB: f64 = 1024.0;

/// Named units accepted in configuration: (name, divisor, suffix).
const NAMED_UNITS: &[(&str, f64, &str)] = &[
    ("B", 1.0, "B/s"),
    ("KB", KIB, "KB/s"),
    ("MB", KIB * KIB, "MB/s"),
    ("GB", KIB * KIB * KIB, "GB/s"),
];

pub const DEFAULT_UNIT: &str = "MB";

impl Unit {
    /// Builds a unit from an explicit divisor. The divisor must be finite and > 0.
    pub fn new(value: f64, speed: impl Into<String>) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(AgentError::config(format!(
                "unit divisor must be a positive number, got {value}"
            )));
        }
        Ok(Self {
            value,
            speed: speed.into(),
        })
    }

    /// Looks up a named unit ("B", "KB", "MB", "GB"), case-insensitive.
    pub fn named(name: &str) -> Result<Self> {
        NAMED_UNITS
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, value, speed)| Self {
                value: *value,
                speed: (*speed).to_string(),
            })
            .ok_or_else(|| {
                let known: Vec<&str> = NAMED_UNITS.iter().map(|(n, _, _)| *n).collect();
                AgentError::config(format!(
                    "unknown unit '{name}', expected one of {}",
                    known.join(", ")
                ))
            })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn speed(&self) -> &str {
        &self.speed
    }

    pub fn convert(&self, raw: f64) -> (f64, &str) {
        convert(raw, self)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            value: KIB * KIB,
            speed: "MB/s".into(),
        }
    }
}

/// Scales `raw` by the unit divisor and returns the display suffix.
pub fn convert(raw: f64, unit: &Unit) -> (f64, &str) {
    (raw / unit.value, unit.speed.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_units_resolve_case_insensitively() {
        let unit = Unit::named("kb").unwrap();
        assert_eq!(unit.value(), 1024.0);
        assert_eq!(unit.speed(), "KB/s");
        assert_eq!(Unit::named(DEFAULT_UNIT).unwrap(), Unit::default());
    }

    #[test]
    fn unknown_unit_is_configuration_error() {
        let err = Unit::named("TB").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("TB"));
    }

    #[test]
    fn non_positive_divisor_rejected() {
        assert!(Unit::new(0.0, "x").is_err());
        assert!(Unit::new(-1.0, "x").is_err());
        assert!(Unit::new(f64::NAN, "x").is_err());
        assert!(Unit::new(1000.0, "kB/s").is_ok());
    }

    #[test]
    fn convert_scales_back_to_raw() {
        for unit in [Unit::named("B").unwrap(), Unit::named("GB").unwrap(), Unit::new(3.0, "x").unwrap()] {
            for raw in [0.0, 1.0, 12_345.678, 9.0e15] {
                let (scaled, suffix) = convert(raw, &unit);
                assert_eq!(suffix, unit.speed());
                assert!((scaled * unit.value() - raw).abs() <= raw.abs() * 1e-12);
            }
        }
    }
}
