// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed request surface consumed by the transport collaborator.
//!
//! Handlers validate first and mutate second; every method returns
//! [`ApiError`], whose `Validation`/`NotFound` variants map to 4xx and
//! whose `Internal` variant maps to 5xx.

mod agents;
mod approvals;
mod items;
mod plans;
mod stream;

pub use items::{CreateItemRequest, ItemView, UpdateItemRequest};

use gaffer_adapters::AgentAdapter;
use gaffer_core::{Item, ItemId};
use gaffer_engine::{
    AgentManager, EngineError, EventBus, GitExecutor, ItemManager, ReviewReceiveController,
};
use gaffer_storage::StoreError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller error: 4xx at the transport.
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    /// Engine or infrastructure failure: 5xx at the transport.
    #[error(transparent)]
    Internal(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(message) => Self::Validation(message),
            EngineError::Storage(StoreError::NotFound(id)) => Self::NotFound(id.to_string()),
            other => Self::Internal(other),
        }
    }
}

impl ApiError {
    /// Suggested HTTP status for the transport layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Internal(_) => 500,
        }
    }
}

pub struct Api<A> {
    pub(crate) items: Arc<ItemManager<A>>,
    pub(crate) agents: Arc<AgentManager<A>>,
    pub(crate) review_receive: ReviewReceiveController<A>,
    pub(crate) git: GitExecutor,
    pub(crate) bus: EventBus,
}

impl<A: AgentAdapter> Api<A> {
    pub fn new(
        items: Arc<ItemManager<A>>,
        agents: Arc<AgentManager<A>>,
        review_receive: ReviewReceiveController<A>,
        git: GitExecutor,
        bus: EventBus,
    ) -> Self {
        Self { items, agents, review_receive, git, bus }
    }

    pub(crate) fn load_item(&self, item_id: &ItemId) -> Result<Item, ApiError> {
        Ok(self.items.get_item(item_id)?)
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
