// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-core: Core library for the Gaffer orchestration engine
//!
//! Pure data: identifiers, the event model, item and plan configuration,
//! the state deriver, and the on-disk path layout. Nothing here performs
//! I/O; storage and engine crates build on these types.

pub mod agent;
pub mod approval;
pub mod event;
pub mod findings;
pub mod id;
pub mod item;
pub mod paths;
pub mod plan;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{
    is_dev_role, is_system_role, AgentId, AgentRecord, AgentStatus, ROLE_PLANNER, ROLE_REVIEW,
    ROLE_REVIEW_RECEIVER,
};
pub use approval::{ApprovalFlags, AutoDecision, DecisionSource, PromptUi};
pub use event::{Event, EventKind};
pub use findings::{Assessment, Finding, ReviewFindings, Severity};
pub use id::{rand_suffix, EventId, ItemId};
pub use item::{Item, ItemValidationError, LinkMode, RepoSource, RepositoryConfig};
pub use paths::DataLayout;
pub use plan::{Plan, PlanError, PlanTask};
pub use status::{
    agent_roles, derive_agent_statuses, derive_item_status, pending_approvals, ItemStatus,
};
