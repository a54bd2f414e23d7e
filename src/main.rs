use anyhow::Result;
use std::sync::Arc;
use sysagents::agent::StateChange;
use sysagents::classifier::Severity;
use sysagents::source::{CounterSource, SysinfoSource};
use sysagents::*;
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn log_state_change(change: &StateChange) {
    let state = &change.current;
    let previous = change.previous.as_deref().unwrap_or("-");
    match state.severity {
        Severity::Ready => tracing::info!(
            agent = %change.agent, previous, state = %state.tag, value = change.value, "{}", state.label
        ),
        Severity::Warning => tracing::warn!(
            agent = %change.agent, previous, state = %state.tag, value = change.value, "{}", state.label
        ),
        Severity::Error | Severity::Critical => tracing::error!(
            agent = %change.agent, previous, state = %state.tag, severity = %state.severity,
            value = change.value, "{}", state.label
        ),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "{} starting",
        env!("CARGO_PKG_NAME")
    );

    let app_config = config::AppConfig::load()?;
    let source: Arc<dyn CounterSource> = Arc::new(SysinfoSource::new());

    let agents = factory::build_agents(&app_config.agents, source);
    anyhow::ensure!(
        !agents.is_empty(),
        "no agent could be created from {} configured",
        app_config.agents.len()
    );
    tracing::info!(
        agents = agents.len(),
        configured = app_config.agents.len(),
        "agents ready"
    );

    let (state_tx, mut state_rx) =
        broadcast::channel::<StateChange>(app_config.scheduler.state_channel_capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = scheduler::spawn(
        agents.clone(),
        scheduler::SchedulerDeps {
            state_tx,
            shutdown_rx,
        },
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            received = state_rx.recv() => match received {
                Ok(change) => log_state_change(&change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state change subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    for handle in handles {
        let _ = handle.await;
    }
    for agent in &agents {
        tracing::info!(agent = agent.name(), value = %agent.render(), "final value");
    }

    Ok(())
}
