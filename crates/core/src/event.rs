// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event model for the Gaffer system.
//!
//! Events are immutable, append-only records. Each line in an item or agent
//! log is one serialized [`Event`]: the envelope always carries
//! `{id, type, timestamp, itemId}`, agent-scoped events also carry
//! `agentId`, and the kind tag plus payload are flattened alongside.
//!
//! The file append order of an item's log is the authoritative total order;
//! timestamps are informational.

use crate::agent::{AgentId, AgentStatus};
use crate::approval::{ApprovalFlags, AutoDecision, DecisionSource, PromptUi};
use crate::findings::Finding;
use crate::id::{EventId, ItemId};
use crate::item::LinkMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Envelope common to every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Item-scoped event with a fresh id and the current time.
    pub fn new(item_id: ItemId, kind: EventKind) -> Self {
        Self { id: EventId::generate(), timestamp: Utc::now(), item_id, agent_id: None, kind }
    }

    /// Agent-scoped event.
    pub fn for_agent(item_id: ItemId, agent_id: AgentId, kind: EventKind) -> Self {
        Self {
            id: EventId::generate(),
            timestamp: Utc::now(),
            item_id,
            agent_id: Some(agent_id),
            kind,
        }
    }
}

/// Everything that can be recorded in an event log.
///
/// Serializes as `{"type": "kind_tag", ...payload}`. Unknown tags
/// deserialize to `Custom` so newer logs replay on older binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum EventKind {
    // -- item lifecycle --
    #[serde(rename = "item_created")]
    ItemCreated { name: String, repositories: Vec<String> },

    #[serde(rename = "clone_started")]
    CloneStarted { repo_name: String, url: String },

    #[serde(rename = "clone_completed")]
    CloneCompleted {
        repo_name: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "workspace_setup_started")]
    WorkspaceSetupStarted { repo_name: String, path: PathBuf, link_mode: LinkMode },

    #[serde(rename = "workspace_setup_completed")]
    WorkspaceSetupCompleted {
        repo_name: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "plan_created")]
    PlanCreated { summary: String, task_count: usize },

    // -- agent lifecycle --
    #[serde(rename = "agent_started")]
    AgentStarted {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repo_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },

    #[serde(rename = "agent_exited")]
    AgentExited {
        #[serde(default)]
        exit_code: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signal: Option<i32>,
    },

    #[serde(rename = "status_changed")]
    StatusChanged { from: AgentStatus, to: AgentStatus },

    #[serde(rename = "tasks_completed")]
    TasksCompleted,

    #[serde(rename = "stdout")]
    Stdout { chunk: String },

    #[serde(rename = "stderr")]
    Stderr { chunk: String },

    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },

    // -- approval protocol --
    #[serde(rename = "approval_requested")]
    ApprovalRequested {
        command: String,
        ui: PromptUi,
        /// Up to 4 KiB of terminal context around the prompt.
        context: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_decision: Option<AutoDecision>,
        #[serde(default)]
        flags: ApprovalFlags,
    },

    #[serde(rename = "approval_decision")]
    ApprovalDecision {
        /// Id of the `approval_requested` event this resolves.
        request_id: EventId,
        approved: bool,
        source: DecisionSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // -- git observation --
    #[serde(rename = "git_snapshot")]
    GitSnapshot { repo_name: String, branch: String, head: String, changed_files: usize },

    #[serde(rename = "git_snapshot_error")]
    GitSnapshotError { repo_name: String, error: String },

    // -- pull request --
    #[serde(rename = "pr_created")]
    PrCreated { repo_name: String, pr_url: String, pr_number: u64, branch: String, commit_hash: String },

    #[serde(rename = "repo_no_changes")]
    RepoNoChanges { repo_name: String, branch: String },

    // -- review cycle --
    #[serde(rename = "review_findings_extracted")]
    ReviewFindingsExtracted {
        repo_name: String,
        iteration: u32,
        overall_assessment: String,
        critical_count: usize,
        major_count: usize,
        minor_count: usize,
        findings: Vec<Finding>,
    },

    #[serde(rename = "review_receive_started")]
    ReviewReceiveStarted {
        repo_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_number: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_url: Option<String>,
    },

    /// Catch-all for unknown event types (forward compatibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl EventKind {
    /// Wire tag of this kind; `custom` for the catch-all.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ItemCreated { .. } => "item_created",
            Self::CloneStarted { .. } => "clone_started",
            Self::CloneCompleted { .. } => "clone_completed",
            Self::WorkspaceSetupStarted { .. } => "workspace_setup_started",
            Self::WorkspaceSetupCompleted { .. } => "workspace_setup_completed",
            Self::PlanCreated { .. } => "plan_created",
            Self::AgentStarted { .. } => "agent_started",
            Self::AgentExited { .. } => "agent_exited",
            Self::StatusChanged { .. } => "status_changed",
            Self::TasksCompleted => "tasks_completed",
            Self::Stdout { .. } => "stdout",
            Self::Stderr { .. } => "stderr",
            Self::Error { .. } => "error",
            Self::ApprovalRequested { .. } => "approval_requested",
            Self::ApprovalDecision { .. } => "approval_decision",
            Self::GitSnapshot { .. } => "git_snapshot",
            Self::GitSnapshotError { .. } => "git_snapshot_error",
            Self::PrCreated { .. } => "pr_created",
            Self::RepoNoChanges { .. } => "repo_no_changes",
            Self::ReviewFindingsExtracted { .. } => "review_findings_extracted",
            Self::ReviewReceiveStarted { .. } => "review_receive_started",
            Self::Custom => "custom",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
