// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item operations.

use super::{Api, ApiError};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{derive_item_status, AgentId, Item, ItemId, ItemStatus, RepositoryConfig};
use gaffer_engine::items::{CreateItem, UpdateItem};

/// An item with its derived status.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: Item,
    pub status: ItemStatus,
}

#[derive(Debug, Clone)]
pub struct CreateItemRequest {
    pub name: String,
    pub description: String,
    pub design_doc: String,
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub design_doc: Option<String>,
}

impl<A: AgentAdapter> Api<A> {
    /// Create the item and stage its workspace in the background; staging
    /// progress is observable on the event stream.
    pub async fn create_item(&self, request: CreateItemRequest) -> Result<ItemView, ApiError> {
        let item = self.items.create_item(CreateItem {
            name: request.name,
            description: request.description,
            design_doc: request.design_doc,
            repositories: request.repositories,
        })?;

        let items = self.items.clone();
        let item_id = item.id.clone();
        tokio::spawn(async move {
            if let Err(e) = items.setup_workspace(&item_id).await {
                tracing::error!(%item_id, error = %e, "workspace setup failed");
            }
        });

        Ok(ItemView { item, status: ItemStatus::Created })
    }

    pub fn list_items(&self) -> Result<Vec<ItemView>, ApiError> {
        let mut views = Vec::new();
        for item in self.items.list_items()? {
            let events = self.agents.recorder().history(&item.id)?;
            let status = derive_item_status(&item, &events);
            views.push(ItemView { item, status });
        }
        Ok(views)
    }

    pub fn get_item(&self, item_id: &ItemId) -> Result<ItemView, ApiError> {
        let item = self.load_item(item_id)?;
        let events = self.agents.recorder().history(item_id)?;
        let status = derive_item_status(&item, &events);
        Ok(ItemView { item, status })
    }

    pub fn update_item(
        &self,
        item_id: &ItemId,
        request: UpdateItemRequest,
    ) -> Result<ItemView, ApiError> {
        let item = self.items.update_item(
            item_id,
            UpdateItem {
                name: request.name,
                description: request.description,
                design_doc: request.design_doc,
            },
        )?;
        let events = self.agents.recorder().history(item_id)?;
        let status = derive_item_status(&item, &events);
        Ok(ItemView { item, status })
    }

    pub async fn delete_item(&self, item_id: &ItemId) -> Result<(), ApiError> {
        Ok(self.items.delete_item(item_id).await?)
    }

    /// Re-stage the workspace; runs in the background like creation.
    pub fn retry_setup(&self, item_id: &ItemId) -> Result<(), ApiError> {
        self.load_item(item_id)?;
        let items = self.items.clone();
        let item_id = item_id.clone();
        tokio::spawn(async move {
            if let Err(e) = items.retry_setup(&item_id).await {
                tracing::error!(%item_id, error = %e, "workspace retry failed");
            }
        });
        Ok(())
    }

    /// Push and open draft PRs for every repository, in sequence.
    pub async fn create_prs(&self, item_id: &ItemId) -> Result<(), ApiError> {
        let item = self.load_item(item_id)?;
        self.git.create_prs(&item).await?;
        Ok(())
    }

    pub async fn start_review_receive(
        &self,
        item_id: &ItemId,
        repo_name: Option<&str>,
    ) -> Result<AgentId, ApiError> {
        Ok(self.review_receive.start(item_id, repo_name).await?)
    }
}
