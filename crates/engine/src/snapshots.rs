// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic git snapshots per item.
//!
//! Every 20 seconds, each repository workspace is inspected (branch, HEAD,
//! dirty-file count) and a `git_snapshot` event recorded. Snapshots are
//! best-effort: a failing repository emits `git_snapshot_error` and the
//! timer keeps ticking. Stopping an item cancels its timer.

use crate::git;
use crate::record::Recorder;
use gaffer_core::{Event, EventKind, Item, ItemId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Clone, Default)]
pub struct Snapshots {
    timers: Arc<Mutex<HashMap<ItemId, CancellationToken>>>,
}

impl Snapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the snapshot timer for an item. Restarting replaces the
    /// previous timer.
    pub fn start(&self, recorder: Recorder, item: &Item) {
        let token = CancellationToken::new();
        if let Some(previous) = self.timers.lock().insert(item.id.clone(), token.clone()) {
            previous.cancel();
        }

        let item = item.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SNAPSHOT_INTERVAL);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so a fresh workspace
            // isn't snapshotted mid-clone.
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => snapshot_item(&recorder, &item).await,
                }
            }
            tracing::debug!(item_id = %item.id, "snapshot timer stopped");
        });
    }

    /// Cancel the item's snapshot timer, if any.
    pub fn stop(&self, item_id: &ItemId) {
        if let Some(token) = self.timers.lock().remove(item_id) {
            token.cancel();
        }
    }

    pub fn is_running(&self, item_id: &ItemId) -> bool {
        self.timers.lock().contains_key(item_id)
    }
}

async fn snapshot_item(recorder: &Recorder, item: &Item) {
    for repo in &item.repositories {
        let workdir = recorder.layout().repo_workspace(&item.id, &repo.directory_name);
        let kind = match capture(&workdir).await {
            Ok((branch, head, changed_files)) => EventKind::GitSnapshot {
                repo_name: repo.directory_name.clone(),
                branch,
                head,
                changed_files,
            },
            Err(e) => EventKind::GitSnapshotError {
                repo_name: repo.directory_name.clone(),
                error: e.to_string(),
            },
        };
        if let Err(e) = recorder.record(&Event::new(item.id.clone(), kind)) {
            tracing::warn!(item_id = %item.id, error = %e, "failed to record git snapshot");
        }
    }
}

async fn capture(
    workdir: &std::path::Path,
) -> Result<(String, String, usize), crate::error::EngineError> {
    let branch = git::run(workdir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
    let head = git::run(workdir, &["rev-parse", "HEAD"]).await?;
    let status = git::run(workdir, &["status", "--porcelain"]).await?;
    let changed_files = status.lines().filter(|l| !l.trim().is_empty()).count();
    Ok((branch, head, changed_files))
}
