// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and event helpers for tests in this crate and downstream crates.

use crate::agent::AgentId;
use crate::event::{Event, EventKind};
use crate::id::ItemId;
use crate::item::{Item, LinkMode, RepoSource, RepositoryConfig};
use crate::plan::PlanTask;
use chrono::Utc;

/// Fluent builder for [`Item`] fixtures.
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            item: Item {
                id: ItemId::new(id),
                name: "test item".to_string(),
                description: String::new(),
                design_doc: String::new(),
                repositories: Vec::new(),
                created_at: Utc::now(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.item.name = name.into();
        self
    }

    pub fn design_doc(mut self, doc: impl Into<String>) -> Self {
        self.item.design_doc = doc.into();
        self
    }

    pub fn remote_repo(
        mut self,
        directory_name: impl Into<String>,
        role: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.item.repositories.push(RepositoryConfig {
            directory_name: directory_name.into(),
            role: role.into(),
            source: RepoSource::Remote {
                url: url.into(),
                base_branch: None,
                submodules: false,
                work_branch: None,
            },
        });
        self
    }

    pub fn local_repo(
        mut self,
        directory_name: impl Into<String>,
        role: impl Into<String>,
        path: impl Into<std::path::PathBuf>,
    ) -> Self {
        self.item.repositories.push(RepositoryConfig {
            directory_name: directory_name.into(),
            role: role.into(),
            source: RepoSource::Local { path: path.into(), link_mode: LinkMode::Symlink },
        });
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}

/// A plan task with the common fields filled in.
pub fn plan_task(id: &str, role: &str, repository: &str) -> PlanTask {
    PlanTask {
        id: id.to_string(),
        title: format!("task {}", id),
        description: String::new(),
        agent_role: role.to_string(),
        repository: repository.to_string(),
        dependencies: Vec::new(),
        files: Vec::new(),
    }
}

/// Item-scoped event fixture.
pub fn item_event(item_id: &ItemId, kind: EventKind) -> Event {
    Event::new(item_id.clone(), kind)
}

/// Agent-scoped event fixture.
pub fn agent_event(item_id: &ItemId, agent_id: &AgentId, kind: EventKind) -> Event {
    Event::for_agent(item_id.clone(), agent_id.clone(), kind)
}
