// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! `Validation` is the caller's fault and surfaces as a 4xx-equivalent at
//! the API layer; everything else is infrastructure and surfaces as 5xx,
//! usually after being recorded as an `error` event on the owning item.

use gaffer_adapters::AdapterError;
use gaffer_storage::{EventLogError, PlanStoreError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    EventLog(#[from] EventLogError),
    #[error(transparent)]
    PlanStore(#[from] PlanStoreError),
    #[error("agent adapter: {0}")]
    Adapter(#[from] AdapterError),
    #[error("git: {0}")]
    Git(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
