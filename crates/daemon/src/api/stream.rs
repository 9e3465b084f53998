// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event stream subscriptions.
//!
//! The transport pushes every event of a subscribed item to its client.
//! Subscribers that lag drop messages and resynchronize from the event
//! log; the bus never retains history.

use super::{Api, ApiError};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{Event, ItemId};
use gaffer_engine::bus::ItemSubscription;
use tokio::sync::broadcast;

impl<A: AgentAdapter> Api<A> {
    /// Subscribe to one item's events.
    pub fn subscribe_item(&self, item_id: &ItemId) -> Result<ItemSubscription, ApiError> {
        self.load_item(item_id)?;
        Ok(self.bus.subscribe_item(item_id))
    }

    /// Firehose across all items.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
