// System time agent

use super::{Agent, AgentSettings, Cached, StateChange};
use crate::error::{AgentError, Result};
use crate::source::CounterSource;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reports the system clock: the value is seconds since the Unix epoch, the
/// rendering is local time in a strftime pattern.
pub struct SystemTimeAgent {
    settings: AgentSettings,
    format: String,
    source: Arc<dyn CounterSource>,
    time: Cached<Option<DateTime<Utc>>>,
}

impl SystemTimeAgent {
    pub fn new(
        settings: AgentSettings,
        format: Option<String>,
        source: Arc<dyn CounterSource>,
    ) -> Result<Self> {
        let format = format
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.into());
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(AgentError::config(format!(
                "agent '{}': invalid time format '{format}'",
                settings.name
            )));
        }
        Ok(Self {
            settings,
            format,
            source,
            time: Cached::new(None),
        })
    }
}

impl Agent for SystemTimeAgent {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn label(&self) -> &str {
        self.settings.label.as_deref().unwrap_or("System time")
    }

    fn summary(&self) -> &str {
        self.settings
            .summary
            .as_deref()
            .unwrap_or("Current date and time of the system clock")
    }

    fn sampling_period(&self) -> Duration {
        self.settings.sampling_period
    }

    fn refresh(&self) -> Result<Option<StateChange>> {
        self.time.set(Some(self.source.system_time()?));
        Ok(None)
    }

    /// Seconds since the Unix epoch; 0 before the first refresh.
    fn value(&self) -> f64 {
        self.time.get().map_or(0.0, |t| t.timestamp() as f64)
    }

    fn render(&self) -> String {
        self.time
            .get()
            .map(|t| t.with_timezone(&Local).format(&self.format).to_string())
            .unwrap_or_default()
    }
}
