// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review-receive: reopen a finished cycle from pull-request feedback.
//!
//! Requests are serialized per item through [`ItemLocks`]; validation runs
//! under the lock so a second caller observes the first one's side effects
//! (archived plan, `review_receive_started`) and fails cleanly instead of
//! interleaving archival with spawn.

use crate::agents::AgentManager;
use crate::error::EngineError;
use crate::locks::ItemLocks;
use crate::plan_watcher::{self, WatchTarget};
use crate::prompts;
use gaffer_adapters::AgentAdapter;
use gaffer_core::{
    derive_item_status, AgentId, Event, EventKind, ItemId, ItemStatus, ROLE_REVIEW_RECEIVER,
};
use gaffer_storage::{archive_plan, ItemStore};
use std::sync::Arc;

pub struct ReviewReceiveController<A> {
    agents: Arc<AgentManager<A>>,
    store: ItemStore,
    locks: ItemLocks,
}

impl<A: AgentAdapter> ReviewReceiveController<A> {
    pub fn new(agents: Arc<AgentManager<A>>, store: ItemStore, locks: ItemLocks) -> Self {
        Self { agents, store, locks }
    }

    /// Start a review-receive cycle for the item, optionally pinned to one
    /// repository's pull request.
    pub async fn start(
        &self,
        item_id: &ItemId,
        repo_name: Option<&str>,
    ) -> Result<AgentId, EngineError> {
        let _serial = self.locks.acquire(item_id).await;

        let item = self.store.load(item_id)?;
        let events = self.agents.recorder().history(item_id)?;
        let status = derive_item_status(&item, &events);
        if !matches!(status, ItemStatus::Completed | ItemStatus::Error) {
            return Err(EngineError::validation(format!(
                "review-receive requires a completed or errored item, status is {}",
                status
            )));
        }

        let receiver_active = self
            .agents
            .list_for_item(item_id)
            .iter()
            .any(|r| r.role == ROLE_REVIEW_RECEIVER && !r.status.is_terminal());
        if receiver_active {
            return Err(EngineError::validation("review-receive already in progress"));
        }

        let (pr_repo, pr_number, pr_url) = locate_pr(&events, repo_name).ok_or_else(|| {
            EngineError::validation(match repo_name {
                Some(repo) => format!("no pull request recorded for repository {}", repo),
                None => "no pull request recorded for this item".to_string(),
            })
        })?;

        // Pre-allocate the id so the start event and the watcher agree on
        // the producer before the process exists.
        let agent_id = AgentId::generate(ROLE_REVIEW_RECEIVER, None);
        let started = Event::for_agent(
            item_id.clone(),
            agent_id.clone(),
            EventKind::ReviewReceiveStarted {
                repo_name: pr_repo.clone(),
                pr_number: Some(pr_number),
                pr_url: Some(pr_url.clone()),
            },
        );
        self.agents.recorder().record(&started)?;

        let layout = self.agents.recorder().layout().clone();
        if let Some(archived) = archive_plan(&layout.plan_path(item_id))? {
            tracing::info!(%item_id, archived = %archived.display(), "previous plan archived");
        }

        plan_watcher::spawn(
            self.agents.clone(),
            item.clone(),
            WatchTarget { role: ROLE_REVIEW_RECEIVER.to_string(), agent_id: Some(agent_id.clone()) },
        );

        let prompt = prompts::review_receive(&item, &pr_repo, Some(pr_number), Some(&pr_url));
        self.agents
            .start_with_id(
                agent_id.clone(),
                item_id,
                ROLE_REVIEW_RECEIVER,
                None,
                &prompt,
                &layout.workspace_root(item_id),
            )
            .await?;

        tracing::info!(%item_id, agent_id = %agent_id, repo = pr_repo, pr_number, "review receive started");
        Ok(agent_id)
    }
}

/// Pull-request info for the requested repo, else the most recent one.
fn locate_pr(events: &[Event], repo_name: Option<&str>) -> Option<(String, u64, String)> {
    events.iter().rev().find_map(|event| match &event.kind {
        EventKind::PrCreated { repo_name: repo, pr_url, pr_number, .. } => {
            if repo_name.is_none() || repo_name == Some(repo.as_str()) {
                Some((repo.clone(), *pr_number, pr_url.clone()))
            } else {
                None
            }
        }
        _ => None,
    })
}

#[cfg(test)]
#[path = "review_receive_tests.rs"]
mod tests;
