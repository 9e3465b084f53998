// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finalize refuses to push a protected branch.

use super::support::*;
use gaffer_core::{EventKind, ItemStatus, LinkMode, RepoSource, RepositoryConfig};
use gaffer_daemon::api::CreateItemRequest;
use serial_test::serial;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn protected_branch_rejection() {
    let w = world().await;

    // A local repository sitting on `main`.
    let source = w.dir.path().join("local-app");
    std::fs::create_dir_all(&source).expect("source dir");
    sh(&source, "git init -b main . && git -c user.email=t@t -c user.name=t commit --allow-empty -m init")
        .await;

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "local work".to_string(),
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

    w.api.create_prs(&item_id).await.expect("create prs runs");

    let events = w.events(&item_id);
    assert!(events.iter().any(|e| matches!(
        &e.kind,
        EventKind::Error { message, .. } if message.contains("protected")
    )));
    assert_eq!(w.count(&item_id, "pr_created"), 0);
    assert_eq!(w.api.get_item(&item_id).expect("get item").status, ItemStatus::Error);
}
