// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State deriver: pure functions from event history to current status.
//!
//! Never writes. The input slice must be in log append order; that order is
//! the authoritative total order for an item, so re-running any of these
//! functions over the same log always yields the same answer.

use crate::agent::{AgentId, AgentStatus, ROLE_PLANNER, ROLE_REVIEW_RECEIVER};
use crate::approval::AutoDecision;
use crate::event::{Event, EventKind};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Derived status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Created,
    Cloning,
    Error,
    WaitingApproval,
    ReviewReceiving,
    Planning,
    Running,
    Completed,
    Ready,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Cloning => "cloning",
            Self::Error => "error",
            Self::WaitingApproval => "waiting_approval",
            Self::ReviewReceiving => "review_receiving",
            Self::Planning => "planning",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Ready => "ready",
        };
        write!(f, "{}", s)
    }
}

/// Left-fold per-agent statuses out of an event list.
///
/// An agent appears only once its `agent_started` is seen. `stopped` is
/// sticky: it is written by the orchestrator and survives a later
/// `agent_exited`; conversely a terminal exit is only ever overridden by
/// `stopped`.
pub fn derive_agent_statuses(events: &[Event]) -> HashMap<AgentId, AgentStatus> {
    let mut statuses: HashMap<AgentId, AgentStatus> = HashMap::new();
    for event in events {
        let Some(agent_id) = &event.agent_id else { continue };
        match &event.kind {
            EventKind::AgentStarted { .. } => {
                statuses.insert(agent_id.clone(), AgentStatus::Running);
            }
            EventKind::AgentExited { exit_code, .. } => {
                if let Some(status) = statuses.get_mut(agent_id) {
                    if *status != AgentStatus::Stopped {
                        *status = if *exit_code == Some(0) {
                            AgentStatus::Completed
                        } else {
                            AgentStatus::Error
                        };
                    }
                }
            }
            EventKind::ApprovalRequested { .. } => {
                if let Some(status) = statuses.get_mut(agent_id) {
                    if *status != AgentStatus::Stopped {
                        *status = AgentStatus::WaitingApproval;
                    }
                }
            }
            EventKind::ApprovalDecision { .. } => {
                if let Some(status) = statuses.get_mut(agent_id) {
                    if *status == AgentStatus::WaitingApproval {
                        *status = AgentStatus::Running;
                    }
                }
            }
            EventKind::StatusChanged { to, .. } => {
                if let Some(status) = statuses.get_mut(agent_id) {
                    let allowed = match *status {
                        AgentStatus::Stopped => false,
                        AgentStatus::Completed | AgentStatus::Error => *to == AgentStatus::Stopped,
                        _ => true,
                    };
                    if allowed {
                        *status = *to;
                    }
                }
            }
            _ => {}
        }
    }
    statuses
}

/// Map each started agent to its role: the role carried by `agent_started`,
/// falling back to parsing the id.
pub fn agent_roles(events: &[Event]) -> HashMap<AgentId, String> {
    let mut roles = HashMap::new();
    for event in events {
        if let (Some(agent_id), EventKind::AgentStarted { role, .. }) =
            (&event.agent_id, &event.kind)
        {
            let role = if role.is_empty() {
                agent_id.role().unwrap_or_default().to_string()
            } else {
                role.clone()
            };
            roles.insert(agent_id.clone(), role);
        }
    }
    roles
}

/// All `approval_requested` events not yet referenced by a decision and not
/// auto-denied.
pub fn pending_approvals(events: &[Event]) -> Vec<Event> {
    let decided: HashSet<&str> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::ApprovalDecision { request_id, .. } => Some(request_id.as_str()),
            _ => None,
        })
        .collect();
    events
        .iter()
        .filter(|e| match &e.kind {
            EventKind::ApprovalRequested { auto_decision, .. } => {
                *auto_decision != Some(AutoDecision::Deny) && !decided.contains(e.id.as_str())
            }
            _ => false,
        })
        .cloned()
        .collect()
}

/// Derive the item status; first matching rule wins.
pub fn derive_item_status(item: &Item, events: &[Event]) -> ItemStatus {
    if events.is_empty() {
        return ItemStatus::Created;
    }

    // An error not followed by per-repo terminal progress surfaces as error.
    let last_error = events.iter().rposition(|e| matches!(e.kind, EventKind::Error { .. }));
    if let Some(err_idx) = last_error {
        let recovered = events[err_idx + 1..].iter().any(|e| {
            matches!(e.kind, EventKind::PrCreated { .. } | EventKind::RepoNoChanges { .. })
        });
        if !recovered {
            return ItemStatus::Error;
        }
    }

    if let Some(status) = staging_status(events) {
        return status;
    }

    let statuses = derive_agent_statuses(events);
    let roles = agent_roles(events);

    if statuses.values().any(|s| *s == AgentStatus::WaitingApproval) {
        return ItemStatus::WaitingApproval;
    }

    if let Some(rr_idx) =
        events.iter().rposition(|e| matches!(e.kind, EventKind::ReviewReceiveStarted { .. }))
    {
        let planned =
            events[rr_idx + 1..].iter().any(|e| matches!(e.kind, EventKind::PlanCreated { .. }));
        if !planned {
            let receiver = events[rr_idx].agent_id.as_ref();
            let receiver_status = receiver.and_then(|id| statuses.get(id));
            return match receiver_status {
                // Not yet started, or still going: the cycle is in flight.
                None => ItemStatus::ReviewReceiving,
                Some(s) if !s.is_terminal() => ItemStatus::ReviewReceiving,
                // Receiver died without producing a plan.
                Some(_) => ItemStatus::Error,
            };
        }
    }

    let planner_running = statuses
        .iter()
        .any(|(id, s)| *s == AgentStatus::Running && role_of(&roles, id) == ROLE_PLANNER);
    if planner_running {
        return ItemStatus::Planning;
    }

    let worker_running = statuses.iter().any(|(id, s)| {
        *s == AgentStatus::Running
            && role_of(&roles, id) != ROLE_PLANNER
            && role_of(&roles, id) != ROLE_REVIEW_RECEIVER
    });
    if worker_running {
        return ItemStatus::Running;
    }

    if is_completed(item, events, &roles) {
        return ItemStatus::Completed;
    }

    if events.iter().any(|e| matches!(e.kind, EventKind::PlanCreated { .. })) {
        return ItemStatus::Ready;
    }

    ItemStatus::Created
}

fn role_of<'a>(roles: &'a HashMap<AgentId, String>, id: &'a AgentId) -> &'a str {
    roles.get(id).map(String::as_str).or_else(|| id.role()).unwrap_or_default()
}

/// Clone / workspace-setup progress. The most recent attempt per
/// repository decides, so a successful retry supersedes an old failure.
fn staging_status(events: &[Event]) -> Option<ItemStatus> {
    let mut last_started: HashMap<&str, usize> = HashMap::new();
    for (idx, event) in events.iter().enumerate() {
        match &event.kind {
            EventKind::CloneStarted { repo_name, .. }
            | EventKind::WorkspaceSetupStarted { repo_name, .. } => {
                last_started.insert(repo_name.as_str(), idx);
            }
            _ => {}
        }
    }

    let mut any_failed = false;
    let mut any_pending = false;
    for (repo, started_idx) in last_started {
        let outcome = events[started_idx + 1..].iter().find_map(|e| match &e.kind {
            EventKind::CloneCompleted { repo_name, success, .. }
            | EventKind::WorkspaceSetupCompleted { repo_name, success, .. }
                if repo_name == repo =>
            {
                Some(*success)
            }
            _ => None,
        });
        match outcome {
            Some(false) => any_failed = true,
            Some(true) => {}
            None => any_pending = true,
        }
    }

    if any_failed {
        return Some(ItemStatus::Error);
    }
    if any_pending {
        return Some(ItemStatus::Cloning);
    }
    None
}

/// Completion: every dev agent ever started has signalled `tasks_completed`,
/// every repository reached a terminal PR outcome, and no new planning cycle
/// began after the last of those outcomes.
fn is_completed(item: &Item, events: &[Event], roles: &HashMap<AgentId, String>) -> bool {
    let completed_agents: HashSet<&AgentId> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::TasksCompleted => e.agent_id.as_ref(),
            _ => None,
        })
        .collect();

    for (agent_id, role) in roles {
        if crate::agent::is_dev_role(role) && !completed_agents.contains(agent_id) {
            return false;
        }
    }

    let mut last_terminal_idx = None;
    for repo in &item.repositories {
        let terminal = events.iter().rposition(|e| match &e.kind {
            EventKind::PrCreated { repo_name, .. } | EventKind::RepoNoChanges { repo_name, .. } => {
                *repo_name == repo.directory_name
            }
            _ => false,
        });
        match terminal {
            Some(idx) => {
                last_terminal_idx = Some(last_terminal_idx.map_or(idx, |l: usize| l.max(idx)))
            }
            None => return false,
        }
    }

    let Some(last_idx) = last_terminal_idx else { return false };
    !events[last_idx + 1..].iter().any(|e| {
        matches!(e.kind, EventKind::PlanCreated { .. } | EventKind::ReviewReceiveStarted { .. })
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
