// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two concurrent review-receive requests on one item.

use super::support::*;
use gaffer_core::test_support::item_event;
use gaffer_core::{EventKind, ItemStatus, LinkMode, RepoSource, RepositoryConfig};
use gaffer_daemon::api::CreateItemRequest;
use gaffer_storage as storage;
use serial_test::serial;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_review_receive_is_serialized() {
    let w = Arc::new(world().await);
    let source = w.dir.path().join("local-app");
    std::fs::create_dir_all(&source).expect("source dir");

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "race".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![RepositoryConfig {
                directory_name: "app".to_string(),
                role: "dev".to_string(),
                source: RepoSource::Local {
                    path: source.clone(),
                    link_mode: LinkMode::Symlink,
                },
            }],
        })
        .await
        .expect("create item");
    let item_id = view.item.id.clone();
    wait_for("workspace staged", || w.count(&item_id, "workspace_setup_completed") == 1).await;

    // Park the auto-started planner so the item can read as completed.
    wait_for("planner spawn", || {
        w.adapter.spawned().iter().any(|s| s.agent_id.role() == Some("planner"))
    })
    .await;
    let planner = w
        .adapter
        .spawned()
        .into_iter()
        .find(|s| s.agent_id.role() == Some("planner"))
        .expect("planner spawned")
        .agent_id;
    w.api.stop_agent(&planner).await.expect("stop planner");

    // Bring the item to `completed` by recording a PR for its repo.
    storage::append(
        &w.layout.item_events(&item_id),
        &item_event(
            &item_id,
            EventKind::PrCreated {
                repo_name: "app".to_string(),
                pr_url: "https://github.com/acme/app/pull/3".to_string(),
                pr_number: 3,
                branch: "agent/x/app".to_string(),
                commit_hash: "abc".to_string(),
            },
        ),
    )
    .expect("append pr event");
    assert_eq!(w.api.get_item(&item_id).expect("view").status, ItemStatus::Completed);

    let a = {
        let w = w.clone();
        let item_id = item_id.clone();
        tokio::spawn(async move { w.api.start_review_receive(&item_id, None).await.is_ok() })
    };
    let b = {
        let w = w.clone();
        let item_id = item_id.clone();
        tokio::spawn(async move { w.api.start_review_receive(&item_id, None).await.is_ok() })
    };
    let (a, b) = (a.await.expect("join a"), b.await.expect("join b"));

    // Exactly one cycle started; the loser saw consistent state and failed
    // validation instead of interleaving.
    assert!(a ^ b, "exactly one request may win (a={}, b={})", a, b);
    assert_eq!(w.count(&item_id, "review_receive_started"), 1);
    let receivers = w
        .adapter
        .spawned()
        .iter()
        .filter(|s| s.agent_id.role() == Some("review-receiver"))
        .count();
    assert_eq!(receivers, 1);
    assert_eq!(w.api.get_item(&item_id).expect("view").status, ItemStatus::ReviewReceiving);
}
