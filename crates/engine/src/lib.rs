// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gaffer-engine: the orchestration engine.
//!
//! Wires the event bus, agent manager, item manager, plan watcher, worker
//! controller, review-receive controller, and git executor together.
//! Cross-component communication is by id and by event; dependencies are
//! passed in at construction.

pub mod agents;
pub mod bus;
pub mod error;
pub mod git;
pub mod items;
pub mod locks;
pub mod plan_watcher;
pub mod prompts;
pub mod record;
pub mod review_receive;
pub mod snapshots;
pub mod worker;

pub use agents::AgentManager;
pub use bus::EventBus;
pub use error::EngineError;
pub use git::GitExecutor;
pub use items::ItemManager;
pub use locks::ItemLocks;
pub use record::Recorder;
pub use review_receive::ReviewReceiveController;
pub use snapshots::Snapshots;
pub use worker::WorkerController;
