// Host-side scheduler: one timer task per agent, refreshes never overlap for the same agent.

use crate::agent::{Agent, StateChange};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::Instrument;

/// Channels shared by every agent task.
pub struct SchedulerDeps {
    pub state_tx: broadcast::Sender<StateChange>,
    /// Tasks stop when the value changes or the sender is dropped.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Run one refresh on the blocking pool (source reads hit the filesystem).
pub async fn refresh_agent(agent: Arc<dyn Agent>) -> anyhow::Result<Option<StateChange>> {
    let change = tokio::task::spawn_blocking(move || agent.refresh())
        .await
        .map_err(|e| anyhow::anyhow!("agent refresh task join: {}", e))??;
    Ok(change)
}

/// Spawns a refresh loop per agent. The first refresh runs immediately.
pub fn spawn(agents: Vec<Arc<dyn Agent>>, deps: SchedulerDeps) -> Vec<JoinHandle<()>> {
    agents
        .into_iter()
        .map(|agent| spawn_agent(agent, deps.state_tx.clone(), deps.shutdown_rx.clone()))
        .collect()
}

fn spawn_agent(
    agent: Arc<dyn Agent>,
    state_tx: broadcast::Sender<StateChange>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let span = tracing::span!(tracing::Level::DEBUG, "agent", name = %agent.name());
    tokio::spawn(
        async move {
            let mut tick = interval(agent.sampling_period());
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        match refresh_agent(agent.clone()).await {
                            Ok(change) => {
                                tracing::debug!(
                                    value = agent.value(),
                                    rendered = %agent.render(),
                                    "agent refreshed"
                                );
                                if let Some(change) = change
                                    && state_tx.send(change).is_err()
                                {
                                    tracing::debug!("state change dropped, no subscribers");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    operation = "refresh",
                                    value = agent.value(),
                                    "agent refresh failed, keeping last value"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("agent task shutting down");
                        break;
                    }
                }
            }
        }
        .instrument(span),
    )
}
