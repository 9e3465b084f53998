// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifiers, roles, and lifecycle state.
//!
//! An agent is a single AI-assistant child process owned by an item. Its id
//! encodes the role and (for repository-bound agents) the repository
//! directory name, separated by double hyphens so that roles and repo names
//! containing single hyphens stay parseable.

use crate::id::{rand_suffix, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Role of the planning agent.
pub const ROLE_PLANNER: &str = "planner";
/// Role of review agents spawned by the worker controller.
pub const ROLE_REVIEW: &str = "review";
/// Role of the agent that turns PR review comments into a new plan cycle.
pub const ROLE_REVIEW_RECEIVER: &str = "review-receiver";

/// Roles managed by the orchestrator itself rather than the plan.
pub fn is_system_role(role: &str) -> bool {
    role == ROLE_PLANNER || role == ROLE_REVIEW_RECEIVER
}

/// Whether a role denotes a development agent bound to a repository.
pub fn is_dev_role(role: &str) -> bool {
    !is_system_role(role) && role != ROLE_REVIEW
}

/// Unique identifier for an agent instance.
///
/// `agent-{role}--{repoName}--{rand6}` when bound to a repository,
/// `agent-{role}--{rand6}` otherwise. Legacy ids used single hyphens
/// throughout; [`AgentId::role`] still recovers known roles from those.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh agent id for the given role, optionally bound to a
    /// repository directory name.
    pub fn generate(role: &str, repo_name: Option<&str>) -> Self {
        match repo_name {
            Some(repo) => Self(format!("agent-{}--{}--{}", role, repo, rand_suffix(6))),
            None => Self(format!("agent-{}--{}", role, rand_suffix(6))),
        }
    }

    /// Create an AgentId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the role encoded in this id.
    ///
    /// Double-hyphen ids split structurally. Legacy single-hyphen ids are
    /// matched against the known role names (longest first, so
    /// `review-receiver` wins over `review`).
    pub fn role(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("agent-")?;
        if rest.contains("--") {
            return rest.split("--").next().filter(|s| !s.is_empty());
        }
        // Legacy single-hyphen form: agent-{role}-{rand}
        for role in [ROLE_REVIEW_RECEIVER, ROLE_PLANNER, ROLE_REVIEW] {
            if rest == role || rest.starts_with(&format!("{}-", role)) {
                return Some(role);
            }
        }
        rest.split('-').next().filter(|s| !s.is_empty())
    }

    /// Recover the repository directory name, if this id is repo-bound.
    pub fn repo_name(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("agent-")?;
        let mut parts = rest.split("--");
        let _role = parts.next()?;
        let second = parts.next()?;
        // Three segments means role--repo--rand; two means role--rand.
        match parts.next() {
            Some(_rand) => Some(second),
            None => None,
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Starting,
    Running,
    WaitingApproval,
    WaitingOrchestrator,
    Stopped,
    Completed,
    Error,
}

impl AgentStatus {
    /// Active statuses require a live PTY; an active agent without one is an
    /// orphan and must be transitioned to `Stopped` on startup.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::WaitingApproval | Self::WaitingOrchestrator)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Error)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::WaitingApproval => "waiting_approval",
            Self::WaitingOrchestrator => "waiting_orchestrator",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// In-memory record of an agent, owned by the agent manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: AgentId,
    pub item_id: ItemId,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl AgentRecord {
    pub fn new(id: AgentId, item_id: ItemId, role: impl Into<String>) -> Self {
        let repo_name = id.repo_name().map(str::to_string);
        Self {
            id,
            item_id,
            role: role.into(),
            repo_name,
            status: AgentStatus::Idle,
            pid: None,
            started_at: None,
            stopped_at: None,
            exit_code: None,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
