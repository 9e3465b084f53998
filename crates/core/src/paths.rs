// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout under the data root.
//!
//! Every path in the system is derived here; no other component
//! concatenates path segments for item, agent, or workspace state.

use crate::agent::AgentId;
use crate::id::ItemId;
use std::path::{Path, PathBuf};

/// Deterministic mapping from identifiers to filesystem paths.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items_dir(&self) -> PathBuf {
        self.root.join("items")
    }

    pub fn item_dir(&self, item_id: &ItemId) -> PathBuf {
        self.items_dir().join(item_id.as_str())
    }

    pub fn item_config(&self, item_id: &ItemId) -> PathBuf {
        self.item_dir(item_id).join("item.yaml")
    }

    pub fn item_events(&self, item_id: &ItemId) -> PathBuf {
        self.item_dir(item_id).join("events.jsonl")
    }

    pub fn workspace_root(&self, item_id: &ItemId) -> PathBuf {
        self.item_dir(item_id).join("workspace")
    }

    pub fn repo_workspace(&self, item_id: &ItemId, repo_name: &str) -> PathBuf {
        self.workspace_root(item_id).join(repo_name)
    }

    pub fn plan_path(&self, item_id: &ItemId) -> PathBuf {
        self.workspace_root(item_id).join("plan.yaml")
    }

    pub fn findings_path(&self, item_id: &ItemId, repo_name: &str) -> PathBuf {
        self.repo_workspace(item_id, repo_name).join("review_findings.json")
    }

    pub fn agents_dir(&self, item_id: &ItemId) -> PathBuf {
        self.item_dir(item_id).join("agents")
    }

    pub fn agent_dir(&self, item_id: &ItemId, agent_id: &AgentId) -> PathBuf {
        self.agents_dir(item_id).join(agent_id.as_str())
    }

    pub fn agent_events(&self, item_id: &ItemId, agent_id: &AgentId) -> PathBuf {
        self.agent_dir(item_id, agent_id).join("events.jsonl")
    }

    pub fn repositories_catalog(&self) -> PathBuf {
        self.root.join("repositories.yaml")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
