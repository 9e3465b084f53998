// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker controller: dev parallelism, the bounded review loop, and
//! finalize.
//!
//! Phase 1 spawns one dev agent per repository with dev tasks and waits
//! for all of them to settle (terminal or waiting for the orchestrator).
//! Phase 2 runs at most three review iterations per repository, feeding
//! findings back to the still-running dev agent. Phase 3 stops whatever is
//! left and hands every repository to the git executor in sequence.
//!
//! `active_dev_agents` is mutated only here.

use crate::agents::AgentManager;
use crate::error::EngineError;
use crate::git::GitExecutor;
use crate::prompts;
use crate::snapshots::Snapshots;
use gaffer_adapters::AgentAdapter;
use gaffer_core::{
    AgentId, AgentStatus, Event, EventKind, Item, ItemId, Plan, PlanTask, ReviewFindings,
    ROLE_REVIEW,
};
use gaffer_storage::{read_findings, read_plan, ItemStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SETTLE_POLL: Duration = Duration::from_millis(250);
const MAX_REVIEW_ITERATIONS: u32 = 3;

pub struct WorkerController<A> {
    agents: Arc<AgentManager<A>>,
    store: ItemStore,
    snapshots: Snapshots,
    git: GitExecutor,
    active_dev: Mutex<HashMap<(ItemId, String), AgentId>>,
}

impl<A: AgentAdapter> WorkerController<A> {
    pub fn new(
        agents: Arc<AgentManager<A>>,
        store: ItemStore,
        snapshots: Snapshots,
        git: GitExecutor,
    ) -> Arc<Self> {
        Arc::new(Self { agents, store, snapshots, git, active_dev: Mutex::new(HashMap::new()) })
    }

    pub fn active_dev_agent(&self, item_id: &ItemId, repo_name: &str) -> Option<AgentId> {
        self.active_dev.lock().get(&(item_id.clone(), repo_name.to_string())).cloned()
    }

    /// Run the plan: dev phase, review loop, finalize.
    pub async fn run(self: &Arc<Self>, item_id: &ItemId) -> Result<(), EngineError> {
        let item = self.store.load(item_id)?;
        let plan_path = self.agents.recorder().layout().plan_path(item_id);
        let plan = match read_plan(&plan_path) {
            Ok(plan) => plan,
            Err(gaffer_storage::PlanStoreError::NotFound(_)) => {
                return Err(EngineError::validation("item has no plan"));
            }
            Err(e) => return Err(e.into()),
        };
        plan.validate(&item).map_err(|e| EngineError::validation(e.to_string()))?;

        tracing::info!(%item_id, tasks = plan.tasks.len(), "starting worker run");
        self.snapshots.start(self.agents.recorder().clone(), &item);

        let result = self.run_phases(&item, &plan).await;

        // Finalize always stops leftovers; the snapshot timer dies with the
        // cycle either way.
        self.snapshots.stop(item_id);
        result
    }

    async fn run_phases(self: &Arc<Self>, item: &Item, plan: &Plan) -> Result<(), EngineError> {
        let dev_agents = self.start_dev_agents(item, plan).await?;
        self.wait_for_settle(&dev_agents).await;

        for repo_name in plan.review_repos(item) {
            self.review_loop(item, plan, repo_name).await?;
        }

        self.finalize(item).await
    }

    /// Phase 1: one dev agent per repository that has dev tasks.
    async fn start_dev_agents(
        self: &Arc<Self>,
        item: &Item,
        plan: &Plan,
    ) -> Result<Vec<AgentId>, EngineError> {
        let layout = self.agents.recorder().layout().clone();
        let workspace_root = layout.workspace_root(&item.id);
        let mut started = Vec::new();

        for repo_name in plan.dev_repos(item) {
            let Some(repo) = item.repo(repo_name) else { continue };
            let workdir = layout.repo_workspace(&item.id, repo_name);
            guard_workdir(&workspace_root, &workdir)?;

            let tasks: Vec<&PlanTask> =
                plan.dev_tasks().filter(|t| t.repository == repo_name).collect();
            let prompt = prompts::dev(item, repo_name, &tasks);

            let agent_id = self
                .agents
                .start(&item.id, &repo.role, Some(repo_name), &prompt, &workdir)
                .await?;
            self.active_dev
                .lock()
                .insert((item.id.clone(), repo_name.to_string()), agent_id.clone());
            started.push(agent_id);
        }
        Ok(started)
    }

    /// Phase 2, one repository: up to three review iterations.
    async fn review_loop(
        self: &Arc<Self>,
        item: &Item,
        plan: &Plan,
        repo_name: &str,
    ) -> Result<(), EngineError> {
        let layout = self.agents.recorder().layout().clone();
        let workdir = layout.repo_workspace(&item.id, repo_name);
        guard_workdir(&layout.workspace_root(&item.id), &workdir)?;
        let findings_path = layout.findings_path(&item.id, repo_name);
        let tasks: Vec<&PlanTask> =
            plan.review_tasks().filter(|t| t.repository == repo_name).collect();

        for iteration in 1..=MAX_REVIEW_ITERATIONS {
            let _ = std::fs::remove_file(&findings_path);

            let prompt = prompts::review(item, repo_name, &tasks, plan);
            let review_agent = self
                .agents
                .start(&item.id, ROLE_REVIEW, Some(repo_name), &prompt, &workdir)
                .await?;
            self.wait_for_settle(std::slice::from_ref(&review_agent)).await;

            let findings = match read_findings(&findings_path) {
                Ok(findings) => findings,
                Err(e) => {
                    tracing::warn!(repo = repo_name, error = %e, "unreadable review findings, treating as absent");
                    None
                }
            };
            let Some(findings) = findings else {
                tracing::info!(repo = repo_name, iteration, "no findings file, review done");
                break;
            };
            if findings.passes() {
                tracing::info!(repo = repo_name, iteration, "review passed");
                break;
            }

            self.record_findings(item, repo_name, iteration, &findings);
            self.agents.stop(&review_agent).await?;

            if iteration == MAX_REVIEW_ITERATIONS {
                tracing::info!(repo = repo_name, "review iteration limit reached");
                break;
            }

            if !self.send_feedback(item, repo_name, &findings).await? {
                break;
            }
        }
        Ok(())
    }

    /// Deliver findings to the repository's dev agent and wait for it to
    /// settle again. Returns false when there is no agent to deliver to.
    async fn send_feedback(
        &self,
        item: &Item,
        repo_name: &str,
        findings: &ReviewFindings,
    ) -> Result<bool, EngineError> {
        let Some(dev) = self.active_dev_agent(&item.id, repo_name) else {
            tracing::warn!(repo = repo_name, "no active dev agent for feedback");
            return Ok(false);
        };
        let status = self.agents.status_of(&dev);
        let deliverable = matches!(
            status,
            Some(AgentStatus::Running | AgentStatus::WaitingOrchestrator)
        );
        if !deliverable {
            tracing::warn!(agent_id = %dev, ?status, "dev agent not deliverable, skipping feedback");
            return Ok(false);
        }

        // Reset to running before the send so the agent's next completion
        // signal can't be outrun by the status write.
        self.agents.set_status(&dev, AgentStatus::Running)?;
        self.agents.send_input(&dev, &prompts::feedback(repo_name, findings)).await?;
        self.wait_for_settle(std::slice::from_ref(&dev)).await;
        Ok(true)
    }

    fn record_findings(
        &self,
        item: &Item,
        repo_name: &str,
        iteration: u32,
        findings: &ReviewFindings,
    ) {
        let (critical_count, major_count, minor_count) = findings.severity_counts();
        let event = Event::new(
            item.id.clone(),
            EventKind::ReviewFindingsExtracted {
                repo_name: repo_name.to_string(),
                iteration,
                overall_assessment: "needs_fixes".to_string(),
                critical_count,
                major_count,
                minor_count,
                findings: findings.findings.clone(),
            },
        );
        if let Err(e) = self.agents.recorder().record(&event) {
            tracing::error!(item_id = %item.id, error = %e, "failed to record review findings");
        }
    }

    /// Phase 3: stop leftovers, clear the dev table, open PRs in sequence.
    async fn finalize(&self, item: &Item) -> Result<(), EngineError> {
        self.agents.stop_all_for_item(&item.id).await?;
        self.active_dev.lock().retain(|(item_id, _), _| item_id != &item.id);
        self.git.create_prs(item).await?;
        Ok(())
    }

    /// Poll until every listed agent is terminal or handed back to the
    /// orchestrator. Unknown agents count as settled.
    async fn wait_for_settle(&self, agent_ids: &[AgentId]) {
        loop {
            let settled = agent_ids.iter().all(|id| match self.agents.status_of(id) {
                Some(status) => {
                    status.is_terminal() || status == AgentStatus::WaitingOrchestrator
                }
                None => true,
            });
            if settled {
                return;
            }
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }
}

/// Reject any computed working directory that escapes the workspace root.
fn guard_workdir(workspace_root: &Path, workdir: &Path) -> Result<(), EngineError> {
    let mut normalized = PathBuf::new();
    for component in workdir.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(EngineError::validation(format!(
                        "working directory {} escapes the workspace",
                        workdir.display()
                    )));
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    if normalized.starts_with(workspace_root) {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "working directory {} escapes the workspace",
            workdir.display()
        )))
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
