// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-artifact watcher.
//!
//! Watches the workspace root for `plan.yaml` with an OS watcher plus a
//! 3-second poll (OS watches are unreliable across symlink boundaries).
//! On a valid plan: emit `plan_created`, complete the producing agent, and
//! tell it to exit. Self-terminates on success, on the 30-minute deadline,
//! or when the producer dies without a plan (after a short grace period
//! and one final check).

use crate::agents::AgentManager;
use gaffer_adapters::AgentAdapter;
use gaffer_core::{AgentId, AgentStatus, Event, EventKind, Item, Plan};
use gaffer_storage::read_plan;
use notify::{RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEADLINE: Duration = Duration::from_secs(30 * 60);
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Which agent is expected to produce the plan.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub role: String,
    /// Pre-allocated producer id, when known (review-receive).
    pub agent_id: Option<AgentId>,
}

pub fn spawn<A: AgentAdapter>(
    agents: Arc<AgentManager<A>>,
    item: Item,
    target: WatchTarget,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        watch(agents, item, target).await;
    })
}

async fn watch<A: AgentAdapter>(agents: Arc<AgentManager<A>>, item: Item, target: WatchTarget) {
    let layout = agents.recorder().layout().clone();
    let workspace = layout.workspace_root(&item.id);
    let plan_path = layout.plan_path(&item.id);

    let (fs_tx, mut fs_rx) = mpsc::channel::<()>(16);
    let _watcher = start_fs_watcher(&workspace, fs_tx);

    let deadline = tokio::time::Instant::now() + DEADLINE;
    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        if let Some(plan) = try_read_valid_plan(&plan_path, &item) {
            finish(&agents, &item, &target, plan).await;
            return;
        }

        if producer_is_terminal(&agents, &item, &target) {
            // Grace period: the plan write may still be landing.
            tokio::time::sleep(EXIT_GRACE).await;
            if let Some(plan) = try_read_valid_plan(&plan_path, &item) {
                finish(&agents, &item, &target, plan).await;
                return;
            }
            record_error(
                &agents,
                &item,
                &format!("{} agent exited without producing a plan", target.role),
            );
            return;
        }

        tokio::select! {
            _ = poll.tick() => {}
            _ = fs_rx.recv() => {}
            _ = tokio::time::sleep_until(deadline) => {
                record_error(&agents, &item, "plan was not produced within the deadline");
                return;
            }
        }
    }
}

fn start_fs_watcher(
    workspace: &Path,
    fs_tx: mpsc::Sender<()>,
) -> Option<notify::RecommendedWatcher> {
    let mut watcher = match notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            if matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_)
            ) {
                let _ = fs_tx.blocking_send(());
            }
        }
    }) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(error = %e, "fs watcher unavailable, polling only");
            return None;
        }
    };
    if let Err(e) = watcher.watch(workspace, RecursiveMode::NonRecursive) {
        tracing::warn!(error = %e, path = %workspace.display(), "fs watch failed, polling only");
        return None;
    }
    Some(watcher)
}

/// Parse and validate; an unparseable or invalid file is treated as "not
/// there yet"; the producer may still be writing or fixing it.
fn try_read_valid_plan(plan_path: &Path, item: &Item) -> Option<Plan> {
    if !plan_path.exists() {
        return None;
    }
    match read_plan(plan_path) {
        Ok(plan) => match plan.validate(item) {
            Ok(()) => Some(plan),
            Err(e) => {
                tracing::warn!(item_id = %item.id, error = %e, "plan artifact is invalid, waiting");
                None
            }
        },
        Err(e) => {
            tracing::debug!(item_id = %item.id, error = %e, "plan artifact unreadable, waiting");
            None
        }
    }
}

fn producer_is_terminal<A: AgentAdapter>(
    agents: &AgentManager<A>,
    item: &Item,
    target: &WatchTarget,
) -> bool {
    match locate_producer(agents, item, target) {
        Some(record) => record.status.is_terminal(),
        // Not started yet; keep waiting.
        None => false,
    }
}

/// The running agent of the expected role, else the most recent one.
fn locate_producer<A: AgentAdapter>(
    agents: &AgentManager<A>,
    item: &Item,
    target: &WatchTarget,
) -> Option<gaffer_core::AgentRecord> {
    if let Some(agent_id) = &target.agent_id {
        return agents.get(agent_id);
    }
    let records = agents.list_for_item(&item.id);
    records
        .iter()
        .find(|r| r.role == target.role && r.status == AgentStatus::Running)
        .cloned()
        .or_else(|| records.into_iter().rev().find(|r| r.role == target.role))
}

async fn finish<A: AgentAdapter>(
    agents: &Arc<AgentManager<A>>,
    item: &Item,
    target: &WatchTarget,
    plan: Plan,
) {
    let event = Event::new(
        item.id.clone(),
        EventKind::PlanCreated { summary: plan.summary.clone(), task_count: plan.tasks.len() },
    );
    if let Err(e) = agents.recorder().record(&event) {
        tracing::error!(item_id = %item.id, error = %e, "failed to record plan_created");
        return;
    }
    tracing::info!(item_id = %item.id, tasks = plan.tasks.len(), "plan created");

    let Some(producer) = locate_producer(agents.as_ref(), item, target) else {
        tracing::warn!(item_id = %item.id, role = target.role, "no producing agent to complete");
        return;
    };
    if let Err(e) = agents.set_status(&producer.id, AgentStatus::Completed) {
        tracing::warn!(agent_id = %producer.id, error = %e, "failed to complete producer");
    }
    if let Err(e) = agents.send_input(&producer.id, "/exit").await {
        tracing::debug!(agent_id = %producer.id, error = %e, "producer exit nudge failed");
    }
}

fn record_error<A: AgentAdapter>(agents: &Arc<AgentManager<A>>, item: &Item, message: &str) {
    let event = Event::new(
        item.id.clone(),
        EventKind::Error { message: message.to_string(), context: None },
    );
    if let Err(e) = agents.recorder().record(&event) {
        tracing::error!(item_id = %item.id, error = %e, "failed to record watcher error");
    }
}

#[cfg(test)]
#[path = "plan_watcher_tests.rs"]
mod tests;
