// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan artifact model and validation.
//!
//! The planner agent writes `plan.yaml` at the workspace root; the worker
//! controller consumes it. Validation runs against the owning item so task
//! roles and repositories stay inside the item's configuration.

use crate::agent::ROLE_REVIEW;
use crate::id::ItemId;
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Declarative task list for an item, produced once per planning cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub version: String,
    pub item_id: ItemId,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tasks: Vec<PlanTask>,
}

/// One unit of agent work inside a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Role label of the agent meant to execute this task.
    #[serde(rename = "agent")]
    pub agent_role: String,
    /// Target repository; must match an item repo directory name.
    pub repository: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

/// Reasons a plan artifact is rejected.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan version is missing")]
    MissingVersion,
    #[error("plan itemId {found} does not match item {expected}")]
    ItemMismatch { expected: ItemId, found: ItemId },
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("task {0} has an empty title")]
    MissingTitle(String),
    #[error("task {0} has an empty agent role")]
    MissingAgent(String),
    #[error("task {task}: role {role} is not configured on the item")]
    UnknownRole { task: String, role: String },
    #[error("task {task}: repository {repository} is not configured on the item")]
    UnknownRepository { task: String, repository: String },
    #[error("task {task}: dependency {dependency} is not part of the plan")]
    UnknownDependency { task: String, dependency: String },
}

impl Plan {
    /// Validate the plan against the owning item's repository and role sets.
    pub fn validate(&self, item: &Item) -> Result<(), PlanError> {
        if self.version.trim().is_empty() {
            return Err(PlanError::MissingVersion);
        }
        if self.item_id != item.id {
            return Err(PlanError::ItemMismatch {
                expected: item.id.clone(),
                found: self.item_id.clone(),
            });
        }

        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(PlanError::DuplicateTaskId(task.id.clone()));
            }
        }

        let roles = item.role_set();
        let repos: HashSet<&str> = item.repo_names().into_iter().collect();
        for task in &self.tasks {
            if task.title.trim().is_empty() {
                return Err(PlanError::MissingTitle(task.id.clone()));
            }
            if task.agent_role.trim().is_empty() {
                return Err(PlanError::MissingAgent(task.id.clone()));
            }
            if task.agent_role != ROLE_REVIEW && !roles.contains(task.agent_role.as_str()) {
                return Err(PlanError::UnknownRole {
                    task: task.id.clone(),
                    role: task.agent_role.clone(),
                });
            }
            if !repos.contains(task.repository.as_str()) {
                return Err(PlanError::UnknownRepository {
                    task: task.id.clone(),
                    repository: task.repository.clone(),
                });
            }
            for dep in &task.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(PlanError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tasks for development agents (everything except review tasks).
    pub fn dev_tasks(&self) -> impl Iterator<Item = &PlanTask> {
        self.tasks.iter().filter(|t| t.agent_role != ROLE_REVIEW)
    }

    /// Review-role tasks.
    pub fn review_tasks(&self) -> impl Iterator<Item = &PlanTask> {
        self.tasks.iter().filter(|t| t.agent_role == ROLE_REVIEW)
    }

    /// Repositories that have at least one dev task, in item order.
    pub fn dev_repos<'a>(&'a self, item: &'a Item) -> Vec<&'a str> {
        item.repo_names()
            .into_iter()
            .filter(|name| self.dev_tasks().any(|t| t.repository == *name))
            .collect()
    }

    /// Repositories that have at least one review task, in item order.
    pub fn review_repos<'a>(&'a self, item: &'a Item) -> Vec<&'a str> {
        item.repo_names()
            .into_iter()
            .filter(|name| self.review_tasks().any(|t| t.repository == *name))
            .collect()
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
