// System uptime agent

use super::{Agent, AgentSettings, Cached, StateChange};
use crate::error::Result;
use crate::source::CounterSource;
use std::sync::Arc;
use std::time::Duration;

pub struct UptimeAgent {
    settings: AgentSettings,
    source: Arc<dyn CounterSource>,
    uptime: Cached<Duration>,
}

impl UptimeAgent {
    pub fn new(settings: AgentSettings, source: Arc<dyn CounterSource>) -> Self {
        Self {
            settings,
            source,
            uptime: Cached::new(Duration::ZERO),
        }
    }
}

impl Agent for UptimeAgent {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn label(&self) -> &str {
        self.settings.label.as_deref().unwrap_or("System uptime")
    }

    fn summary(&self) -> &str {
        self.settings
            .summary
            .as_deref()
            .unwrap_or("Time since the system was booted")
    }

    fn sampling_period(&self) -> Duration {
        self.settings.sampling_period
    }

    fn refresh(&self) -> Result<Option<StateChange>> {
        self.uptime.set(self.source.uptime()?);
        Ok(None)
    }

    /// Seconds since boot.
    fn value(&self) -> f64 {
        self.uptime.get().as_secs() as f64
    }

    fn render(&self) -> String {
        format_uptime(self.uptime.get())
    }
}

/// "N days, HH:MM:SS", with the day part omitted below one day.
pub(crate) fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let clock = format!("{:02}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_days() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_uptime(Duration::from_secs(3_661)), "01:01:01");
        assert_eq!(format_uptime(Duration::from_secs(86_400 + 5)), "1 day, 00:00:05");
        assert_eq!(format_uptime(Duration::from_secs(3 * 86_400 + 7_200)), "3 days, 02:00:00");
    }
}
