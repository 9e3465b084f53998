// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event recording: append to the owning logs, then publish on the bus.
//!
//! The append happens before the publish and before any in-memory state
//! change anywhere in the engine; a subscriber can always re-read the log
//! and see at least what it was just told.

use crate::bus::EventBus;
use crate::error::EngineError;
use gaffer_core::paths::DataLayout;
use gaffer_core::Event;
use gaffer_storage as storage;

#[derive(Debug, Clone)]
pub struct Recorder {
    layout: DataLayout,
    bus: EventBus,
}

impl Recorder {
    pub fn new(layout: DataLayout, bus: EventBus) -> Self {
        Self { layout, bus }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Append the event to its logs (agent log first for agent-scoped
    /// events), then publish it.
    pub fn record(&self, event: &Event) -> Result<(), EngineError> {
        storage::append_agent_event(&self.layout, &event.item_id, event)?;
        self.bus.publish(event);
        Ok(())
    }

    /// Read an item's full event history in log order.
    pub fn history(&self, item_id: &gaffer_core::ItemId) -> Result<Vec<Event>, EngineError> {
        Ok(storage::read(&self.layout.item_events(item_id))?)
    }
}
