// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval-protocol data types shared by the classifier, the PTY
//! supervisor, and the event model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of approval UI the assistant is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptUi {
    /// Numbered option list with an arrow marker.
    Menu,
    /// Bracketed `[y/n]` / `[yes/no]` question.
    Yn,
    /// Unrecognized layout; responses stay conservative (bare newline).
    Unknown,
}

impl fmt::Display for PromptUi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => write!(f, "menu"),
            Self::Yn => write!(f, "yn"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Annotative flags attached to every approval request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalFlags {
    /// Path escapes the agent workspace or touches system/secret dirs.
    #[serde(default)]
    pub is_outside_workspace: bool,
    /// Matches a destructive command pattern.
    #[serde(default)]
    pub is_destructive: bool,
    /// Filename matches credential patterns.
    #[serde(default)]
    pub involves_secrets: bool,
    /// Matches a network command pattern.
    #[serde(default)]
    pub involves_network: bool,
}

/// Decision the supervisor took on its own, recorded on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoDecision {
    Approve,
    Deny,
}

/// Who resolved an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    Auto,
    User,
}
