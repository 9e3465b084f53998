// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item configuration persistence and the saved-repositories catalog.
//!
//! `item.yaml` is written once on creation and rewritten on metadata
//! updates; the repository list never changes after creation. The catalog
//! at `$DATA/repositories.yaml` remembers remote repositories across items
//! so the UI can offer them again.

use gaffer_core::paths::DataLayout;
use gaffer_core::{Item, ItemId, RepoSource};
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A remote repository remembered across items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRepository {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    /// Last role this repository was configured with.
    pub role: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Catalog {
    #[serde(default)]
    repositories: Vec<SavedRepository>,
}

/// Filesystem-backed store for item configurations.
#[derive(Debug, Clone)]
pub struct ItemStore {
    layout: DataLayout,
}

impl ItemStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    fn io_err(path: &std::path::Path, source: std::io::Error) -> StoreError {
        StoreError::Io { path: path.display().to_string(), source }
    }

    /// Persist an item's configuration, creating its directory.
    pub fn save(&self, item: &Item) -> Result<(), StoreError> {
        let dir = self.layout.item_dir(&item.id);
        fs::create_dir_all(&dir).map_err(|e| Self::io_err(&dir, e))?;
        let path = self.layout.item_config(&item.id);
        let yaml = serde_yaml::to_string(item)?;
        fs::write(&path, yaml).map_err(|e| Self::io_err(&path, e))
    }

    pub fn load(&self, item_id: &ItemId) -> Result<Item, StoreError> {
        let path = self.layout.item_config(item_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(item_id.clone()))
            }
            Err(e) => return Err(Self::io_err(&path, e)),
        };
        Ok(serde_yaml::from_str(&content)?)
    }

    /// All persisted items, newest first by creation time.
    pub fn list(&self) -> Result<Vec<Item>, StoreError> {
        let items_dir = self.layout.items_dir();
        let entries = match fs::read_dir(&items_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_err(&items_dir, e)),
        };
        let mut items = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_err(&items_dir, e))?;
            let id = ItemId::new(entry.file_name().to_string_lossy().to_string());
            match self.load(&id) {
                Ok(item) => items.push(item),
                // Stray directories without a config are skipped, not fatal.
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => {
                    tracing::warn!(item_id = %id, error = %e, "skipping unreadable item config");
                    continue;
                }
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// Remove the item directory and everything under it.
    pub fn delete(&self, item_id: &ItemId) -> Result<(), StoreError> {
        let dir = self.layout.item_dir(item_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(item_id.clone()))
            }
            Err(e) => Err(Self::io_err(&dir, e)),
        }
    }

    /// Record an item's remote repositories in the catalog, deduplicated
    /// by URL with the newest role winning.
    pub fn remember_repositories(&self, item: &Item) -> Result<(), StoreError> {
        let mut catalog = self.load_catalog()?;
        for repo in &item.repositories {
            if let RepoSource::Remote { url, base_branch, .. } = &repo.source {
                catalog.repositories.retain(|saved| saved.url != *url);
                catalog.repositories.push(SavedRepository {
                    url: url.clone(),
                    base_branch: base_branch.clone(),
                    role: repo.role.clone(),
                });
            }
        }
        let path = self.layout.repositories_catalog();
        let yaml = serde_yaml::to_string(&catalog)?;
        fs::write(&path, yaml).map_err(|e| Self::io_err(&path, e))
    }

    pub fn saved_repositories(&self) -> Result<Vec<SavedRepository>, StoreError> {
        Ok(self.load_catalog()?.repositories)
    }

    fn load_catalog(&self) -> Result<Catalog, StoreError> {
        let path = self.layout.repositories_catalog();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(serde_yaml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Catalog::default()),
            Err(e) => Err(Self::io_err(&path, e)),
        }
    }
}

#[cfg(test)]
#[path = "item_store_tests.rs"]
mod tests;
