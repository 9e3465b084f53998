// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item lifecycle: creation, workspace staging, planner auto-start,
//! update and deletion.
//!
//! Staging runs all repositories in parallel; each repository's progress
//! is narrated through `clone_*` / `workspace_setup_*` events so the state
//! deriver can report `cloning` and staging failures without any extra
//! bookkeeping. Deleting an item stops its snapshot timers, then its
//! agents, then removes the directory.

use crate::agents::AgentManager;
use crate::error::EngineError;
use crate::plan_watcher::{self, WatchTarget};
use crate::record::Recorder;
use crate::snapshots::Snapshots;
use crate::{git, prompts};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{
    Event, EventKind, Item, ItemId, LinkMode, RepoSource, RepositoryConfig, ROLE_PLANNER,
};
use gaffer_storage::ItemStore;
use std::path::Path;
use std::sync::Arc;

/// Parameters for `create_item`.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub description: String,
    pub design_doc: String,
    pub repositories: Vec<RepositoryConfig>,
}

/// Metadata fields that may change after creation.
#[derive(Debug, Clone, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub design_doc: Option<String>,
}

pub struct ItemManager<A> {
    agents: Arc<AgentManager<A>>,
    store: ItemStore,
    snapshots: Snapshots,
}

impl<A: AgentAdapter> ItemManager<A> {
    pub fn new(agents: Arc<AgentManager<A>>, store: ItemStore, snapshots: Snapshots) -> Self {
        Self { agents, store, snapshots }
    }

    fn recorder(&self) -> &Recorder {
        self.agents.recorder()
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Allocate an id, persist the configuration, emit `item_created`.
    pub fn create_item(&self, params: CreateItem) -> Result<Item, EngineError> {
        let item = Item {
            id: ItemId::generate(),
            name: params.name,
            description: params.description,
            design_doc: params.design_doc,
            repositories: params.repositories,
            created_at: chrono::Utc::now(),
        };
        item.validate().map_err(|e| EngineError::validation(e.to_string()))?;

        self.store.save(&item)?;
        if let Err(e) = self.store.remember_repositories(&item) {
            tracing::warn!(item_id = %item.id, error = %e, "failed to update repository catalog");
        }

        let event = Event::new(
            item.id.clone(),
            EventKind::ItemCreated {
                name: item.name.clone(),
                repositories: item.repo_names().iter().map(|s| s.to_string()).collect(),
            },
        );
        self.recorder().record(&event)?;
        tracing::info!(item_id = %item.id, repos = item.repositories.len(), "item created");
        Ok(item)
    }

    pub fn get_item(&self, item_id: &ItemId) -> Result<Item, EngineError> {
        Ok(self.store.load(item_id)?)
    }

    pub fn list_items(&self) -> Result<Vec<Item>, EngineError> {
        Ok(self.store.list()?)
    }

    /// Update mutable metadata. The repository list is immutable.
    pub fn update_item(&self, item_id: &ItemId, update: UpdateItem) -> Result<Item, EngineError> {
        let mut item = self.store.load(item_id)?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(EngineError::validation("item name must not be empty"));
            }
            item.name = name;
        }
        if let Some(description) = update.description {
            item.description = description;
        }
        if let Some(design_doc) = update.design_doc {
            item.design_doc = design_doc;
        }
        self.store.save(&item)?;
        Ok(item)
    }

    /// Stop observers and agents, then remove the item directory.
    pub async fn delete_item(&self, item_id: &ItemId) -> Result<(), EngineError> {
        self.store.load(item_id)?;
        self.snapshots.stop(item_id);
        self.agents.stop_all_for_item(item_id).await?;
        self.store.delete(item_id)?;
        tracing::info!(%item_id, "item deleted");
        Ok(())
    }

    /// Stage every repository in parallel, then auto-start the planner.
    /// Staging failures are recorded per repository; the planner only
    /// starts when all repositories staged cleanly.
    pub async fn setup_workspace(self: &Arc<Self>, item_id: &ItemId) -> Result<(), EngineError> {
        let item = self.store.load(item_id)?;
        let workspace = self.recorder().layout().workspace_root(&item.id);
        std::fs::create_dir_all(&workspace)?;

        let mut handles = Vec::new();
        for repo in item.repositories.clone() {
            let recorder = self.recorder().clone();
            let item = item.clone();
            handles.push(tokio::spawn(async move {
                stage_repository(&recorder, &item, &repo).await
            }));
        }

        let mut all_ok = true;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(item_id = %item.id, error = %e, "repository staging failed");
                    all_ok = false;
                }
                Err(e) => {
                    tracing::error!(item_id = %item.id, error = %e, "staging task panicked");
                    all_ok = false;
                }
            }
        }

        if !all_ok {
            // The failure is already in the log; the item reads as error.
            return Ok(());
        }

        self.start_planner(&item).await;
        Ok(())
    }

    /// Re-stage after a failure. Existing entries are replaced.
    pub async fn retry_setup(self: &Arc<Self>, item_id: &ItemId) -> Result<(), EngineError> {
        self.setup_workspace(item_id).await
    }

    /// Start the planner and its plan watcher. A planner that fails to
    /// start is an `error` event, not an item teardown.
    async fn start_planner(self: &Arc<Self>, item: &Item) {
        let workspace = self.recorder().layout().workspace_root(&item.id);
        let prompt = prompts::planner(item);
        match self.agents.start(&item.id, ROLE_PLANNER, None, &prompt, &workspace).await {
            Ok(agent_id) => {
                plan_watcher::spawn(
                    self.agents.clone(),
                    item.clone(),
                    WatchTarget { role: ROLE_PLANNER.to_string(), agent_id: Some(agent_id) },
                );
            }
            Err(e) => {
                let event = Event::new(
                    item.id.clone(),
                    EventKind::Error {
                        message: format!("failed to start planner: {}", e),
                        context: None,
                    },
                );
                if let Err(record_err) = self.recorder().record(&event) {
                    tracing::error!(item_id = %item.id, error = %record_err, "failed to record planner error");
                }
            }
        }
    }
}

/// Stage one repository into the workspace, narrating through events.
async fn stage_repository(
    recorder: &Recorder,
    item: &Item,
    repo: &RepositoryConfig,
) -> Result<(), EngineError> {
    let target = recorder.layout().repo_workspace(&item.id, &repo.directory_name);
    remove_existing(&target)?;

    match &repo.source {
        RepoSource::Remote { url, base_branch, submodules, .. } => {
            recorder.record(&Event::new(
                item.id.clone(),
                EventKind::CloneStarted {
                    repo_name: repo.directory_name.clone(),
                    url: url.clone(),
                },
            ))?;

            let result = clone_repository(item, repo, url, base_branch.as_deref(), *submodules, &target).await;
            let (success, error) = match &result {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };
            recorder.record(&Event::new(
                item.id.clone(),
                EventKind::CloneCompleted {
                    repo_name: repo.directory_name.clone(),
                    success,
                    error,
                },
            ))?;
            result
        }
        RepoSource::Local { path, link_mode } => {
            recorder.record(&Event::new(
                item.id.clone(),
                EventKind::WorkspaceSetupStarted {
                    repo_name: repo.directory_name.clone(),
                    path: path.clone(),
                    link_mode: *link_mode,
                },
            ))?;

            let result = link_local(path, *link_mode, &target);
            let (success, error) = match &result {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };
            recorder.record(&Event::new(
                item.id.clone(),
                EventKind::WorkspaceSetupCompleted {
                    repo_name: repo.directory_name.clone(),
                    success,
                    error,
                },
            ))?;
            result
        }
    }
}

/// Remove whatever currently occupies the staging target: directories
/// recursively, symlinks and files by unlink.
fn remove_existing(target: &Path) -> Result<(), EngineError> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => Ok(std::fs::remove_dir_all(target)?),
        Ok(_) => Ok(std::fs::remove_file(target)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn clone_repository(
    item: &Item,
    repo: &RepositoryConfig,
    url: &str,
    base_branch: Option<&str>,
    submodules: bool,
    target: &Path,
) -> Result<(), EngineError> {
    let parent = target
        .parent()
        .ok_or_else(|| EngineError::Git("clone target has no parent".to_string()))?;
    let target_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::Git("clone target has no name".to_string()))?;

    let mut args = vec!["clone", url, target_name];
    if let Some(base) = base_branch {
        args.extend_from_slice(&["--branch", base]);
    }
    if submodules {
        args.push("--recurse-submodules");
    }
    git::run(parent, &args).await?;

    if let Some(work_branch) = repo.work_branch(&item.id) {
        git::run(target, &["checkout", "-B", &work_branch]).await?;
    }
    Ok(())
}

fn link_local(source: &Path, link_mode: LinkMode, target: &Path) -> Result<(), EngineError> {
    match link_mode {
        LinkMode::Symlink => {
            // Atomic replace: link under a temp name, then rename over.
            let parent = target
                .parent()
                .ok_or_else(|| EngineError::Git("link target has no parent".to_string()))?;
            let staging = parent.join(format!(".{}.tmp", gaffer_core::rand_suffix(6)));
            std::os::unix::fs::symlink(source, &staging)?;
            std::fs::rename(&staging, target)?;
            Ok(())
        }
        LinkMode::Copy => copy_dir(source, target),
    }
}

fn copy_dir(source: &Path, target: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(target)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let meta = entry.metadata()?;
        if meta.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
