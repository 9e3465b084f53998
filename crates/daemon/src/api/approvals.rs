// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approval operations.

use super::{Api, ApiError};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{pending_approvals, Event, EventId, ItemId};

impl<A: AgentAdapter> Api<A> {
    /// Unresolved, non-auto-denied approval requests for the item.
    pub fn list_pending_approvals(&self, item_id: &ItemId) -> Result<Vec<Event>, ApiError> {
        self.load_item(item_id)?;
        let events = self.agents.recorder().history(item_id)?;
        Ok(pending_approvals(&events))
    }

    /// Resolve one request by the id of its `approval_requested` event.
    pub async fn decide_approval(
        &self,
        item_id: &ItemId,
        request_id: &EventId,
        approve: bool,
        reason: Option<String>,
    ) -> Result<(), ApiError> {
        self.load_item(item_id)?;
        self.agents.decide_approval(item_id, request_id, approve, reason, None).await?;
        Ok(())
    }

    /// Apply decisions to several requests; each result is independent.
    pub async fn batch_decide(
        &self,
        item_id: &ItemId,
        decisions: Vec<(EventId, bool)>,
    ) -> Result<Vec<(EventId, Result<(), ApiError>)>, ApiError> {
        self.load_item(item_id)?;
        let mut results = Vec::with_capacity(decisions.len());
        for (request_id, approve) in decisions {
            let outcome = self
                .agents
                .decide_approval(item_id, &request_id, approve, None, None)
                .await
                .map(|_| ())
                .map_err(ApiError::from);
            results.push((request_id, outcome));
        }
        Ok(results)
    }
}
