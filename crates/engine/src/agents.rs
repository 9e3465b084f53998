// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent lifecycle: spawning, signal bridging, stopping, orphan recovery.
//!
//! The manager owns the in-memory registry and is the only writer of
//! agent-scoped events. Ordering discipline: the event append always
//! happens before the registry mutation it describes, so a crash between
//! the two leaves the log ahead of memory, never behind.

use crate::error::EngineError;
use crate::record::Recorder;
use gaffer_adapters::{AgentAdapter, AgentSignal, SpawnConfig};
use gaffer_core::{
    agent_roles, derive_agent_statuses, is_system_role, AgentId, AgentRecord, AgentStatus,
    ApprovalFlags, AutoDecision, DecisionSource, Event, EventId, EventKind, Item, ItemId,
    PromptUi,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Buffered signals per agent before the bridge applies backpressure.
const SIGNAL_BUFFER: usize = 256;

pub struct AgentManager<A> {
    adapter: A,
    recorder: Recorder,
    registry: Mutex<HashMap<AgentId, AgentRecord>>,
}

impl<A: AgentAdapter> AgentManager<A> {
    pub fn new(adapter: A, recorder: Recorder) -> Arc<Self> {
        Arc::new(Self { adapter, recorder, registry: Mutex::new(HashMap::new()) })
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<AgentRecord> {
        self.registry.lock().get(agent_id).cloned()
    }

    pub fn status_of(&self, agent_id: &AgentId) -> Option<AgentStatus> {
        self.registry.lock().get(agent_id).map(|r| r.status)
    }

    pub fn list_for_item(&self, item_id: &ItemId) -> Vec<AgentRecord> {
        let mut records: Vec<AgentRecord> = self
            .registry
            .lock()
            .values()
            .filter(|r| r.item_id == *item_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        records
    }

    /// Start an agent with a generated id.
    pub async fn start(
        self: &Arc<Self>,
        item_id: &ItemId,
        role: &str,
        repo_name: Option<&str>,
        prompt: &str,
        workdir: &Path,
    ) -> Result<AgentId, EngineError> {
        let agent_id = AgentId::generate(role, repo_name);
        self.start_with_id(agent_id.clone(), item_id, role, repo_name, prompt, workdir).await?;
        Ok(agent_id)
    }

    /// Start an agent under a pre-allocated id (review-receive allocates
    /// the id before emitting its start event).
    pub async fn start_with_id(
        self: &Arc<Self>,
        agent_id: AgentId,
        item_id: &ItemId,
        role: &str,
        repo_name: Option<&str>,
        prompt: &str,
        workdir: &Path,
    ) -> Result<(), EngineError> {
        if !is_system_role(role) && repo_name.is_none() {
            return Err(EngineError::validation(format!(
                "role {} requires a repository name",
                role
            )));
        }

        std::fs::create_dir_all(self.recorder.layout().agent_dir(item_id, &agent_id))?;

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let config = SpawnConfig::new(agent_id.clone(), item_id.clone(), prompt, workdir);

        let pid = match self.adapter.spawn(config, signal_tx).await {
            Ok(pid) => pid,
            Err(e) => {
                let event = Event::for_agent(
                    item_id.clone(),
                    agent_id.clone(),
                    EventKind::Error {
                        message: format!("failed to start agent: {}", e),
                        context: Some(role.to_string()),
                    },
                );
                if let Err(record_err) = self.recorder.record(&event) {
                    tracing::error!(%agent_id, error = %record_err, "failed to record spawn error");
                }
                return Err(e.into());
            }
        };

        let started = Event::for_agent(
            item_id.clone(),
            agent_id.clone(),
            EventKind::AgentStarted {
                role: role.to_string(),
                repo_name: repo_name.map(str::to_string),
                pid: Some(pid),
            },
        );
        self.recorder.record(&started)?;

        let mut record = AgentRecord::new(agent_id.clone(), item_id.clone(), role);
        record.status = AgentStatus::Running;
        record.pid = Some(pid);
        record.started_at = Some(chrono::Utc::now());
        self.registry.lock().insert(agent_id.clone(), record);

        let manager = self.clone();
        let item_id = item_id.clone();
        tokio::spawn(async move {
            manager.bridge(item_id, agent_id, signal_rx).await;
        });

        Ok(())
    }

    /// Route supervisor signals into events and registry updates. This
    /// path never returns an error: persistence failures are logged and
    /// the stream keeps draining so the child is always reaped.
    async fn bridge(
        self: Arc<Self>,
        item_id: ItemId,
        agent_id: AgentId,
        mut signal_rx: mpsc::Receiver<AgentSignal>,
    ) {
        while let Some(signal) = signal_rx.recv().await {
            match signal {
                AgentSignal::Output { chunk } => {
                    self.record_quiet(&agent_id, &item_id, EventKind::Stdout { chunk });
                }
                AgentSignal::TasksCompleted => {
                    let prev = self.status_of(&agent_id).unwrap_or(AgentStatus::Running);
                    self.record_quiet(
                        &agent_id,
                        &item_id,
                        EventKind::StatusChanged {
                            from: prev,
                            to: AgentStatus::WaitingOrchestrator,
                        },
                    );
                    self.record_quiet(&agent_id, &item_id, EventKind::TasksCompleted);
                    self.update_status(&agent_id, AgentStatus::WaitingOrchestrator);
                }
                AgentSignal::ApprovalRequested { command, ui, context, flags } => {
                    self.record_quiet(
                        &agent_id,
                        &item_id,
                        EventKind::ApprovalRequested {
                            command,
                            ui,
                            context,
                            auto_decision: None,
                            flags,
                        },
                    );
                    self.update_status(&agent_id, AgentStatus::WaitingApproval);
                }
                AgentSignal::ApprovalAutoDenied { command, ui, context, flags } => {
                    self.record_auto_denied(&agent_id, &item_id, command, ui, context, flags);
                }
                AgentSignal::ApprovalAutoApproved { command } => {
                    tracing::debug!(%agent_id, command, "auto-approved");
                }
                AgentSignal::Exit { exit_code, signal } => {
                    self.record_quiet(
                        &agent_id,
                        &item_id,
                        EventKind::AgentExited { exit_code, signal },
                    );
                    self.finish(&agent_id, exit_code);
                    break;
                }
            }
        }
        tracing::debug!(%agent_id, "signal bridge deregistered");
    }

    fn record_quiet(&self, agent_id: &AgentId, item_id: &ItemId, kind: EventKind) {
        let event = Event::for_agent(item_id.clone(), agent_id.clone(), kind);
        if let Err(e) = self.recorder.record(&event) {
            tracing::error!(%agent_id, error = %e, "failed to record agent event");
        }
    }

    /// Synthetic request/decision pair for a blocklisted command.
    fn record_auto_denied(
        &self,
        agent_id: &AgentId,
        item_id: &ItemId,
        command: String,
        ui: PromptUi,
        context: String,
        flags: ApprovalFlags,
    ) {
        let request = Event::for_agent(
            item_id.clone(),
            agent_id.clone(),
            EventKind::ApprovalRequested {
                command,
                ui,
                context,
                auto_decision: Some(AutoDecision::Deny),
                flags,
            },
        );
        let request_id = request.id.clone();
        if let Err(e) = self.recorder.record(&request) {
            tracing::error!(%agent_id, error = %e, "failed to record auto-denied request");
            return;
        }
        self.record_quiet(
            agent_id,
            item_id,
            EventKind::ApprovalDecision {
                request_id,
                approved: false,
                source: DecisionSource::Auto,
                reason: Some("blocklisted command".to_string()),
            },
        );
    }

    fn update_status(&self, agent_id: &AgentId, status: AgentStatus) {
        if let Some(record) = self.registry.lock().get_mut(agent_id) {
            if record.status != AgentStatus::Stopped {
                record.status = status;
            }
        }
    }

    fn finish(&self, agent_id: &AgentId, exit_code: Option<i32>) {
        if let Some(record) = self.registry.lock().get_mut(agent_id) {
            if record.status != AgentStatus::Stopped {
                record.status = if exit_code == Some(0) {
                    AgentStatus::Completed
                } else {
                    AgentStatus::Error
                };
            }
            record.exit_code = exit_code;
            record.stopped_at = Some(chrono::Utc::now());
        }
    }

    /// Kill the agent and mark it stopped. A later `agent_exited` from the
    /// dying process must not overwrite the stopped status.
    pub async fn stop(&self, agent_id: &AgentId) -> Result<(), EngineError> {
        let record = self
            .get(agent_id)
            .ok_or_else(|| EngineError::validation(format!("unknown agent {}", agent_id)))?;

        if self.adapter.is_live(agent_id) {
            if let Err(e) = self.adapter.kill(agent_id).await {
                tracing::warn!(%agent_id, error = %e, "kill failed");
            }
        }

        // Already finished on its own terms; nothing to rewrite.
        if record.status.is_terminal() {
            return Ok(());
        }

        let event = Event::for_agent(
            record.item_id.clone(),
            agent_id.clone(),
            EventKind::StatusChanged { from: record.status, to: AgentStatus::Stopped },
        );
        self.recorder.record(&event)?;

        if let Some(record) = self.registry.lock().get_mut(agent_id) {
            record.status = AgentStatus::Stopped;
            record.stopped_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    /// Stop every non-terminal agent of an item.
    pub async fn stop_all_for_item(&self, item_id: &ItemId) -> Result<(), EngineError> {
        for record in self.list_for_item(item_id) {
            if !record.status.is_terminal() {
                self.stop(&record.id).await?;
            }
        }
        Ok(())
    }

    pub async fn send_input(&self, agent_id: &AgentId, input: &str) -> Result<(), EngineError> {
        Ok(self.adapter.send_input(agent_id, input).await?)
    }

    pub async fn resize(
        &self,
        agent_id: &AgentId,
        cols: u16,
        rows: u16,
    ) -> Result<(), EngineError> {
        Ok(self.adapter.resize(agent_id, cols, rows).await?)
    }

    pub fn output_tail(&self, agent_id: &AgentId) -> Option<String> {
        self.adapter.output_tail(agent_id)
    }

    /// Persist a status transition initiated by a controller (e.g. the
    /// worker resetting a dev agent to running after feedback).
    pub fn set_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Result<(), EngineError> {
        let record = self
            .get(agent_id)
            .ok_or_else(|| EngineError::validation(format!("unknown agent {}", agent_id)))?;
        let event = Event::for_agent(
            record.item_id.clone(),
            agent_id.clone(),
            EventKind::StatusChanged { from: record.status, to: status },
        );
        self.recorder.record(&event)?;
        self.update_status(agent_id, status);
        Ok(())
    }

    /// Resolve a pending approval request by the id of its
    /// `approval_requested` event.
    pub async fn decide_approval(
        &self,
        item_id: &ItemId,
        request_id: &EventId,
        approve: bool,
        reason: Option<String>,
        ui: Option<PromptUi>,
    ) -> Result<AgentId, EngineError> {
        let events = self.recorder.history(item_id)?;
        let request = events
            .iter()
            .find(|e| e.id == *request_id && matches!(e.kind, EventKind::ApprovalRequested { .. }))
            .ok_or_else(|| {
                EngineError::validation(format!("approval request {} not found", request_id))
            })?;
        let already_decided = events.iter().any(|e| {
            matches!(&e.kind, EventKind::ApprovalDecision { request_id: r, .. } if r == request_id)
        });
        if already_decided {
            return Err(EngineError::validation(format!(
                "approval request {} already decided",
                request_id
            )));
        }
        let agent_id = request
            .agent_id
            .clone()
            .ok_or_else(|| EngineError::validation("approval request has no agent"))?;

        match self.adapter.process_approval(&agent_id, approve, ui).await {
            Ok(()) => {}
            Err(gaffer_adapters::AdapterError::NotWaiting(id)) => {
                return Err(EngineError::validation(format!("agent {} is not waiting", id)))
            }
            Err(gaffer_adapters::AdapterError::NotFound(id)) => {
                return Err(EngineError::validation(format!("agent {} has no live process", id)))
            }
            Err(e) => return Err(e.into()),
        }

        let decision = Event::for_agent(
            item_id.clone(),
            agent_id.clone(),
            EventKind::ApprovalDecision {
                request_id: request_id.clone(),
                approved: approve,
                source: DecisionSource::User,
                reason,
            },
        );
        self.recorder.record(&decision)?;

        if self.status_of(&agent_id) == Some(AgentStatus::WaitingApproval) {
            self.update_status(&agent_id, AgentStatus::Running);
        }
        Ok(agent_id)
    }

    /// Startup reconciliation: any agent whose log says active but that has
    /// no live process gets a `status_changed(*→stopped)` written FIRST and
    /// the in-memory record updated second. Agents whose role cannot be
    /// determined are skipped entirely: no log write, no memory update.
    pub fn recover_orphans(&self, items: &[Item]) -> Result<usize, EngineError> {
        let mut recovered = 0;
        for item in items {
            let events = self.recorder.history(&item.id)?;
            let statuses = derive_agent_statuses(&events);
            let roles = agent_roles(&events);

            for (agent_id, status) in statuses {
                if !status.is_active() || self.adapter.is_live(&agent_id) {
                    continue;
                }
                let role = roles
                    .get(&agent_id)
                    .cloned()
                    .filter(|r| !r.is_empty())
                    .or_else(|| agent_id.role().map(str::to_string));
                let Some(role) = role else {
                    tracing::warn!(%agent_id, "orphan with undeterminable role, skipping");
                    continue;
                };

                let event = Event::for_agent(
                    item.id.clone(),
                    agent_id.clone(),
                    EventKind::StatusChanged { from: status, to: AgentStatus::Stopped },
                );
                // Write-before-update: the log must show the stop before the
                // registry does.
                self.recorder.record(&event)?;

                let mut record = AgentRecord::new(agent_id.clone(), item.id.clone(), role);
                record.status = AgentStatus::Stopped;
                record.stopped_at = Some(chrono::Utc::now());
                self.registry.lock().insert(agent_id.clone(), record);
                recovered += 1;
                tracing::info!(%agent_id, item_id = %item.id, "orphaned agent stopped");
            }
        }
        Ok(recovered)
    }
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
