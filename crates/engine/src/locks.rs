// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item asynchronous FIFO locks.
//!
//! Serializes review-receive cycles per item. `tokio::sync::Mutex` hands
//! the lock to waiters in arrival order, which gives the chain semantics
//! the protocol needs: a new request awaits everything queued before it.
//! Map entries are pruned once nobody holds or awaits them.

use gaffer_core::ItemId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone, Default)]
pub struct ItemLocks {
    inner: Arc<Mutex<HashMap<ItemId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the item's lock, waiting behind earlier acquirers.
    pub async fn acquire(&self, item_id: &ItemId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            // Prune entries nobody references anymore.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(item_id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
