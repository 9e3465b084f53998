// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction-time wiring and startup reconciliation.
//!
//! Components are built leaves-first and handed their dependencies here;
//! nothing reaches for a global. Before the API is handed out, every
//! item's log is replayed and orphaned agents are stopped, and a
//! background task advances the pipeline whenever a plan lands.

use crate::api::Api;
use crate::env;
use gaffer_adapters::pty::PtyAdapter;
use gaffer_adapters::AgentAdapter;
use gaffer_core::paths::DataLayout;
use gaffer_core::EventKind;
use gaffer_engine::{
    AgentManager, EngineError, EventBus, GitExecutor, ItemLocks, ItemManager, Recorder,
    ReviewReceiveController, Snapshots, WorkerController,
};
use gaffer_storage::ItemStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber configured from `GAFFER_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the engine against the configured data root.
pub async fn bootstrap() -> Result<Api<PtyAdapter>, EngineError> {
    let layout = DataLayout::new(env::data_dir());
    std::fs::create_dir_all(layout.items_dir())?;

    let adapter = PtyAdapter::new(env::agent_bin());
    bootstrap_with(layout, adapter).await
}

/// Adapter-generic wiring, shared with tests.
pub async fn bootstrap_with<A: AgentAdapter + Clone>(
    layout: DataLayout,
    adapter: A,
) -> Result<Api<A>, EngineError> {
    let bus = EventBus::new();
    let recorder = Recorder::new(layout.clone(), bus.clone());
    let store = ItemStore::new(layout);
    let agents = AgentManager::new(adapter, recorder.clone());
    let snapshots = Snapshots::new();
    let git = GitExecutor::new(recorder);

    let items = Arc::new(ItemManager::new(agents.clone(), store.clone(), snapshots.clone()));
    let worker = WorkerController::new(agents.clone(), store.clone(), snapshots, git.clone());
    let review_receive =
        ReviewReceiveController::new(agents.clone(), store.clone(), ItemLocks::new());

    let known_items = store.list()?;
    let recovered = agents.recover_orphans(&known_items)?;
    if recovered > 0 {
        tracing::info!(recovered, "orphaned agents stopped during startup");
    }

    spawn_plan_runner(bus.clone(), worker);

    Ok(Api::new(items, agents, review_receive, git, bus))
}

/// Advance the pipeline: every `plan_created` kicks a worker run for the
/// owning item. Review-receive cycles re-enter the same way.
fn spawn_plan_runner<A: AgentAdapter>(bus: EventBus, worker: Arc<WorkerController<A>>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if matches!(event.kind, EventKind::PlanCreated { .. }) {
                        let worker = worker.clone();
                        let item_id = event.item_id.clone();
                        tokio::spawn(async move {
                            if let Err(e) = worker.run(&item_id).await {
                                tracing::error!(%item_id, error = %e, "worker run failed");
                            }
                        });
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "plan runner lagged behind the event bus");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
