// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use gaffer_core::paths::DataLayout;
use gaffer_core::test_support::ItemBuilder;
use gaffer_core::{derive_item_status, ItemStatus};
use gaffer_storage as storage;
use tempfile::TempDir;

async fn sh(cwd: &Path, script: &str) {
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(script)
        .current_dir(cwd)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "script failed: {}", script);
}

/// A data dir with one item whose repo workspace is a real git clone of a
/// local bare origin. Returns (tempdir, executor, item).
async fn git_fixture(start_branch: Option<&str>) -> (TempDir, GitExecutor, gaffer_core::Item) {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path());
    let item = ItemBuilder::new("ITEM-GIT00001")
        .remote_repo("app", "dev", "file://ignored")
        .build();

    let origin = dir.path().join("origin.git");
    let seed = dir.path().join("seed");
    std::fs::create_dir_all(&origin).unwrap();
    std::fs::create_dir_all(&seed).unwrap();
    sh(&origin, "git init --bare -b main .").await;
    sh(&seed, "git init -b main . && git -c user.email=t@t -c user.name=t commit --allow-empty -m init").await;
    sh(&seed, &format!("git remote add origin {} && git push -q origin main", origin.display()))
        .await;

    let workspace = layout.workspace_root(&item.id);
    std::fs::create_dir_all(&workspace).unwrap();
    sh(&workspace, &format!("git clone -q {} app", origin.display())).await;
    if let Some(branch) = start_branch {
        sh(&workspace.join("app"), &format!("git checkout -q -b {}", branch)).await;
    }

    let executor = GitExecutor::new(Recorder::new(layout, EventBus::new()));
    (dir, executor, item)
}

fn events(dir: &TempDir, item: &gaffer_core::Item) -> Vec<Event> {
    storage::read(&DataLayout::new(dir.path()).item_events(&item.id)).unwrap()
}

#[tokio::test]
async fn protected_branch_is_refused_with_error_event() {
    let (dir, executor, item) = git_fixture(None).await;

    let outcome = executor.create_pr_for_repo(&item, &item.repositories[0]).await;
    assert!(matches!(outcome, PrOutcome::Failed(msg) if msg.contains("protected")));

    let events = events(&dir, &item);
    assert!(matches!(&events[0].kind, EventKind::Error { message, .. } if message.contains("main")));
    assert!(!events.iter().any(|e| matches!(e.kind, EventKind::PrCreated { .. })));
    assert_eq!(derive_item_status(&item, &events), ItemStatus::Error);
}

#[tokio::test]
async fn clean_branch_with_no_commits_emits_no_changes() {
    let (dir, executor, item) = git_fixture(Some("agent/item-git00001/app")).await;

    let outcome = executor.create_pr_for_repo(&item, &item.repositories[0]).await;
    assert_eq!(outcome, PrOutcome::NoChanges);

    let events = events(&dir, &item);
    assert!(matches!(
        &events[0].kind,
        EventKind::RepoNoChanges { repo_name, branch }
            if repo_name == "app" && branch == "agent/item-git00001/app"
    ));
}

#[test]
fn pr_url_parsing() {
    let out = "Creating draft pull request for agent/x into main\nhttps://github.com/acme/app/pull/41\n";
    assert_eq!(
        parse_pr_url(out),
        Some(("https://github.com/acme/app/pull/41".to_string(), 41))
    );
    assert_eq!(parse_pr_url("no url here"), None);
    assert_eq!(parse_pr_url("https://github.com/acme/app/pull/not-a-number"), None);
}

#[test]
fn pr_body_includes_design_section_and_attribution() {
    let mut item = ItemBuilder::new("ITEM-GIT00001")
        .name("checkout")
        .remote_repo("app", "dev", "https://example.com/app.git")
        .build();
    item.description = "Adds one-click checkout.".to_string();
    item.design_doc = "We debounce the button.".to_string();

    let body = pr_body(&item);
    assert!(body.starts_with("Adds one-click checkout."));
    assert!(body.contains("## Design"));
    assert!(body.contains("We debounce the button."));
    assert!(body.contains("ITEM-GIT00001"));
}

#[test]
fn transient_file_list_covers_findings() {
    assert!(TRANSIENT_FILES.contains(&"review_findings.json"));
}
