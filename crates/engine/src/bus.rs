// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event fan-out.
//!
//! Built on a bounded `tokio::sync::broadcast` channel: publishing is
//! synchronous and never blocks the publisher, the bus retains no history,
//! and a subscriber that falls behind loses messages (`Lagged`) rather
//! than slowing anyone down. Per-item subscriptions are a filtered view of
//! the global stream.

use gaffer_core::{Event, ItemId};
use tokio::sync::broadcast;

/// Capacity of the broadcast ring; slow subscribers past this lag drop.
const BUS_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish to all live subscribers. Never blocks; an event with no
    /// subscribers is simply dropped.
    pub fn publish(&self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }

    /// Subscribe to every event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Subscribe to one item's events.
    pub fn subscribe_item(&self, item_id: &ItemId) -> ItemSubscription {
        ItemSubscription { item_id: item_id.clone(), rx: self.tx.subscribe() }
    }
}

/// Filtered per-item subscription.
pub struct ItemSubscription {
    item_id: ItemId,
    rx: broadcast::Receiver<Event>,
}

impl ItemSubscription {
    /// Next event for the subscribed item. `None` when the bus is gone.
    /// Lagged gaps are skipped; observers resynchronize from the event
    /// log, which is the source of truth.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.item_id == self.item_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(item_id = %self.item_id, missed, "event bus subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
