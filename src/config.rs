use crate::classifier::ThresholdBand;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Max number of state changes buffered for slow subscribers.
    #[serde(default = "default_state_channel_capacity")]
    pub state_channel_capacity: usize,
}

fn default_state_channel_capacity() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            state_channel_capacity: default_state_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    DiskStat,
    LoadAverage,
    MemUsed,
    SwapUsed,
    Uptime,
    CpuUsed,
    SystemTime,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentType::DiskStat => write!(f, "disk-stat"),
            AgentType::LoadAverage => write!(f, "load-average"),
            AgentType::MemUsed => write!(f, "mem-used"),
            AgentType::SwapUsed => write!(f, "swap-used"),
            AgentType::Uptime => write!(f, "uptime"),
            AgentType::CpuUsed => write!(f, "cpu-used"),
            AgentType::SystemTime => write!(f, "system-time"),
        }
    }
}

/// Either a named unit ("MB") or an explicit `{ value, speed }` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UnitConfig {
    Named(String),
    Custom { value: f64, speed: String },
}

/// One agent entry. Type-specific settings are checked when the agent is built,
/// so a bad entry only takes down that agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    #[serde(default)]
    pub sampling_period_secs: u32,
    /// disk-stat: "average", "read" or "write".
    pub kind: Option<String>,
    /// load-average: 1, 5 or 15; derived from the sampling period when absent.
    pub span: Option<u64>,
    pub unit: Option<UnitConfig>,
    /// disk-stat: "accumulated" or "per-second".
    pub throughput: Option<String>,
    /// system-time: strftime pattern of the rendered local time.
    pub format: Option<String>,
    pub label: Option<String>,
    pub summary: Option<String>,
    pub bands: Option<Vec<ThresholdBand>>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "sysagents.toml".into());
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.scheduler.state_channel_capacity > 0,
            "scheduler.state_channel_capacity must be > 0, got {}",
            self.scheduler.state_channel_capacity
        );
        anyhow::ensure!(!self.agents.is_empty(), "agents must not be empty");
        let mut names = HashSet::new();
        for agent in &self.agents {
            anyhow::ensure!(!agent.name.is_empty(), "agents.name must be non-empty");
            anyhow::ensure!(
                names.insert(agent.name.as_str()),
                "agents.name must be unique, '{}' appears more than once",
                agent.name
            );
        }
        Ok(())
    }
}
