// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item configuration: the unit of work and its repositories.
//!
//! An item's identity and repository list are immutable for its lifetime;
//! only name, description, and design doc may be updated afterwards.

use crate::id::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// A development work unit covering one or more repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form design document the planner works from.
    #[serde(default)]
    pub design_doc: String,
    pub repositories: Vec<RepositoryConfig>,
    pub created_at: DateTime<Utc>,
}

/// One repository staged into the item workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Directory name under the workspace root; unique within the item.
    pub directory_name: String,
    /// Developer-role label, e.g. `front`, `back`, `docs`.
    pub role: String,
    #[serde(flatten)]
    pub source: RepoSource,
}

/// Where a repository comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RepoSource {
    Remote {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_branch: Option<String>,
        #[serde(default)]
        submodules: bool,
        /// Branch created for this item's work. Defaults deterministically;
        /// see [`RepositoryConfig::work_branch`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        work_branch: Option<String>,
    },
    Local {
        path: PathBuf,
        #[serde(default)]
        link_mode: LinkMode,
    },
}

/// How a local repository is staged into the workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    #[default]
    Symlink,
    Copy,
}

impl RepositoryConfig {
    /// Work branch for a remote repository: the configured branch, or
    /// `agent/{item-id-lowercase}/{directoryName}`.
    pub fn work_branch(&self, item_id: &ItemId) -> Option<String> {
        match &self.source {
            RepoSource::Remote { work_branch, .. } => Some(work_branch.clone().unwrap_or_else(
                || {
                    format!("agent/{}/{}", item_id.as_str().to_lowercase(), self.directory_name)
                },
            )),
            RepoSource::Local { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, RepoSource::Remote { .. })
    }
}

/// Reasons an item configuration is rejected at creation.
#[derive(Debug, Error)]
pub enum ItemValidationError {
    #[error("item must have at least one repository")]
    NoRepositories,
    #[error("duplicate repository directory name: {0}")]
    DuplicateDirectory(String),
    #[error("repository {0} has an empty role")]
    EmptyRole(String),
    #[error("item name must not be empty")]
    EmptyName,
}

impl Item {
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if self.repositories.is_empty() {
            return Err(ItemValidationError::NoRepositories);
        }
        let mut seen = HashSet::new();
        for repo in &self.repositories {
            if !seen.insert(repo.directory_name.as_str()) {
                return Err(ItemValidationError::DuplicateDirectory(
                    repo.directory_name.clone(),
                ));
            }
            if repo.role.trim().is_empty() {
                return Err(ItemValidationError::EmptyRole(repo.directory_name.clone()));
            }
        }
        Ok(())
    }

    pub fn repo(&self, directory_name: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.directory_name == directory_name)
    }

    /// All developer-role labels configured on this item.
    pub fn role_set(&self) -> HashSet<&str> {
        self.repositories.iter().map(|r| r.role.as_str()).collect()
    }

    pub fn repo_names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.directory_name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
