// Scheduler integration: timer tasks refresh agents, forward state changes, stop on shutdown

mod common;

use common::FakeSource;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use sysagents::agent::{
    Agent, AgentSettings, DiskStatAgent, DiskStatKind, LoadAverageAgent, LoadSpan, Throughput,
};
use sysagents::classifier::BandTable;
use sysagents::scheduler::{SchedulerDeps, refresh_agent, spawn};
use sysagents::units::Unit;
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, timeout};

fn load_agent(source: &Arc<FakeSource>) -> Arc<dyn Agent> {
    Arc::new(
        LoadAverageAgent::new(
            AgentSettings::new("load", 1).unwrap(),
            LoadSpan::One,
            BandTable::load_average(),
            source.clone(),
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn scheduler_forwards_initial_state_and_stops_on_shutdown() {
    let source = Arc::new(FakeSource::new());
    source.set_cores(Some(4));
    source.set_load(0.5, 0.3, 0.1);
    let agent = load_agent(&source);

    let (state_tx, mut state_rx) = broadcast::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = spawn(
        vec![agent.clone()],
        SchedulerDeps {
            state_tx,
            shutdown_rx,
        },
    );

    let change = timeout(Duration::from_secs(5), state_rx.recv())
        .await
        .expect("state change in time")
        .expect("channel open");
    assert_eq!(change.agent, "load");
    assert_eq!(change.current.tag, "good");
    assert_eq!(agent.value(), 0.125);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("task stops")
            .unwrap();
    }
}

#[tokio::test]
async fn scheduler_keeps_running_through_source_failures() {
    let source = Arc::new(FakeSource::new());
    source.set_disk(0, 0);
    let agent: Arc<dyn Agent> = Arc::new(
        DiskStatAgent::new(
            AgentSettings::new("disk", 1).unwrap(),
            DiskStatKind::Average,
            Unit::new(1.0, "B/s").unwrap(),
            Throughput::Accumulated,
            source.clone(),
        )
        .unwrap(),
    );
    source.set_failing(true);

    let (state_tx, _state_rx) = broadcast::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = spawn(
        vec![agent.clone()],
        SchedulerDeps {
            state_tx,
            shutdown_rx,
        },
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handles[0].is_finished());
    assert_eq!(agent.value(), 0.0);

    drop(shutdown_tx);
    for handle in handles {
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("task stops when the shutdown sender is dropped")
            .unwrap();
    }
}

#[tokio::test]
async fn refresh_agent_runs_on_blocking_pool() {
    let source = Arc::new(FakeSource::new());
    source.set_disk(100, 100);
    let agent: Arc<dyn Agent> = Arc::new(
        DiskStatAgent::new(
            AgentSettings::new("disk", 1).unwrap(),
            DiskStatKind::Write,
            Unit::new(1.0, "B/s").unwrap(),
            Throughput::Accumulated,
            source.clone(),
        )
        .unwrap(),
    );
    source.set_disk(100, 164);

    let change = refresh_agent(agent.clone()).await.unwrap();
    assert!(change.is_none());
    assert_eq!(agent.value(), 64.0);
    assert_eq!(source.disk_reads.load(Ordering::SeqCst), 2);

    source.set_failing(true);
    assert!(refresh_agent(agent.clone()).await.is_err());
    assert_eq!(agent.value(), 64.0);
}
