// Builds agents from configuration entries.

use crate::agent::{
    Agent, AgentSettings, CpuUsageAgent, DiskStatAgent, DiskStatKind, LoadAverageAgent, LoadSpan,
    MemoryAgent, MemoryKind, SystemTimeAgent, Throughput, UptimeAgent,
};
use crate::classifier::BandTable;
use crate::config::{AgentConfig, AgentType, UnitConfig};
use crate::error::{AgentError, Result};
use crate::source::CounterSource;
use crate::units::{DEFAULT_UNIT, Unit};
use std::sync::Arc;

/// Build one agent. Any configuration problem is returned as
/// [`AgentError::Configuration`]; source failures during seeding are passed through.
pub fn build_agent(
    config: &AgentConfig,
    source: Arc<dyn CounterSource>,
) -> Result<Arc<dyn Agent>> {
    let settings = AgentSettings::new(config.name.clone(), config.sampling_period_secs)?
        .with_label(config.label.clone())
        .with_summary(config.summary.clone());
    reject_unsupported(config)?;

    let agent: Arc<dyn Agent> = match config.agent_type {
        AgentType::DiskStat => {
            let kind = config
                .kind
                .as_deref()
                .unwrap_or("average")
                .parse::<DiskStatKind>()?;
            let throughput = match config.throughput.as_deref() {
                Some(t) => t.parse::<Throughput>()?,
                None => Throughput::default(),
            };
            let unit = build_unit(config.unit.as_ref())?;
            Arc::new(DiskStatAgent::new(settings, kind, unit, throughput, source)?)
        }
        AgentType::LoadAverage => {
            let minutes = config
                .span
                .unwrap_or_else(|| settings.sampling_period_secs() / 60);
            let span = LoadSpan::from_minutes(minutes)?;
            let bands = build_bands(config, BandTable::load_average())?;
            Arc::new(LoadAverageAgent::new(settings, span, bands, source)?)
        }
        AgentType::MemUsed | AgentType::SwapUsed => {
            let kind = if config.agent_type == AgentType::MemUsed {
                MemoryKind::Memory
            } else {
                MemoryKind::Swap
            };
            let bands = build_bands(config, kind.default_bands())?;
            Arc::new(MemoryAgent::new(settings, kind, bands, source))
        }
        AgentType::CpuUsed => {
            let bands = build_bands(config, BandTable::cpu())?;
            Arc::new(CpuUsageAgent::new(settings, bands, source)?)
        }
        AgentType::Uptime => Arc::new(UptimeAgent::new(settings, source)),
        AgentType::SystemTime => Arc::new(SystemTimeAgent::new(
            settings,
            config.format.clone(),
            source,
        )?),
    };

    tracing::info!(
        agent = %config.name,
        agent_type = %config.agent_type,
        sampling_period_secs = config.sampling_period_secs,
        label = agent.label(),
        "agent created"
    );
    Ok(agent)
}

/// Build every configured agent, skipping (and logging) the ones that fail.
pub fn build_agents(
    configs: &[AgentConfig],
    source: Arc<dyn CounterSource>,
) -> Vec<Arc<dyn Agent>> {
    configs
        .iter()
        .filter_map(|config| match build_agent(config, source.clone()) {
            Ok(agent) => Some(agent),
            Err(e) => {
                tracing::error!(
                    agent = %config.name,
                    agent_type = %config.agent_type,
                    error = %e,
                    "agent construction failed"
                );
                None
            }
        })
        .collect()
}

fn build_unit(config: Option<&UnitConfig>) -> Result<Unit> {
    match config {
        None => Unit::named(DEFAULT_UNIT),
        Some(UnitConfig::Named(name)) => Unit::named(name),
        Some(UnitConfig::Custom { value, speed }) => Unit::new(*value, speed.clone()),
    }
}

fn build_bands(config: &AgentConfig, default: Arc<BandTable>) -> Result<Arc<BandTable>> {
    match &config.bands {
        Some(bands) => BandTable::new(bands.clone())
            .map(Arc::new)
            .map_err(|e| AgentError::config(format!("agent '{}': {e}", config.name))),
        None => Ok(default),
    }
}

fn reject_unsupported(config: &AgentConfig) -> Result<()> {
    let t = config.agent_type;
    let disk = t == AgentType::DiskStat;
    let percent = matches!(
        t,
        AgentType::LoadAverage | AgentType::CpuUsed | AgentType::MemUsed | AgentType::SwapUsed
    );
    let checks = [
        ("kind", config.kind.is_some(), disk),
        ("unit", config.unit.is_some(), disk),
        ("throughput", config.throughput.is_some(), disk),
        ("span", config.span.is_some(), t == AgentType::LoadAverage),
        ("format", config.format.is_some(), t == AgentType::SystemTime),
        ("bands", config.bands.is_some(), percent),
    ];
    match checks.iter().find(|(_, set, allowed)| *set && !*allowed) {
        Some((field, _, _)) => Err(AgentError::config(format!(
            "agent '{}': '{field}' is not supported by {t} agents",
            config.name
        ))),
        None => Ok(()),
    }
}
