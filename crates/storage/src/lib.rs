// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-storage: on-disk persistence for items, plans, and event logs.
//!
//! Everything here is plain synchronous filesystem I/O; callers in async
//! contexts treat these as fast local operations the same way the engine
//! treats its own config reads.

mod event_log;
mod item_store;
mod plan_store;

pub use event_log::{append, append_agent_event, read, EventLogError};
pub use item_store::{ItemStore, SavedRepository, StoreError};
pub use plan_store::{archive_plan, read_findings, read_plan, write_plan, PlanStoreError};
