// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two remote repos, a scripted plan, parallel dev agents, passing
//! reviews, and a draft PR per repository.

use super::support::*;
use gaffer_core::{ItemStatus, RepoSource, RepositoryConfig};
use gaffer_daemon::api::CreateItemRequest;
use serial_test::serial;

fn remote(dir_name: &str, role: &str, origin: &std::path::Path) -> RepositoryConfig {
    RepositoryConfig {
        directory_name: dir_name.to_string(),
        role: role.to_string(),
        source: RepoSource::Remote {
            url: origin.display().to_string(),
            base_branch: None,
            submodules: false,
            work_branch: None,
        },
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn happy_path_two_repos() {
    let w = world().await;
    let fe_origin = seed_origin(w.dir.path(), "frontend").await;
    let be_origin = seed_origin(w.dir.path(), "backend").await;

    // Scripts for the whole pipeline, queued before anything runs.
    w.adapter.push_script("front", dev_script("fe-change"));
    w.adapter.push_script("back", dev_script("be-change"));
    w.adapter.push_script("review", review_script(PASS_FINDINGS));
    w.adapter.push_script("review", review_script(PASS_FINDINGS));

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "checkout flow".to_string(),
            description: "one-click checkout".to_string(),
            design_doc: "Debounce the buy button.".to_string(),
            repositories: vec![
                remote("frontend", "front", &fe_origin),
                remote("backend", "back", &be_origin),
            ],
        })
        .await
        .expect("create item");
    let item_id = view.item.id.clone();

    // Planner starts once both clones land; give it the plan to write.
    wait_for("planner spawn", || {
        w.adapter.spawned().iter().any(|s| s.agent_id.role() == Some("planner"))
    })
    .await;
    let plan = plan_yaml(
        &item_id,
        &[
            ("t1", "front", "frontend"),
            ("t2", "front", "frontend"),
            ("t3", "back", "backend"),
            ("t4", "back", "backend"),
            ("r1", "review", "frontend"),
            ("r2", "review", "backend"),
        ],
    );
    std::fs::write(w.layout.plan_path(&item_id), plan).expect("write plan");

    // The pipeline self-advances: plan detected, dev agents run, reviews
    // pass, PRs open.
    wait_for("completion", || {
        w.api
            .get_item(&item_id)
            .map(|v| v.status == ItemStatus::Completed)
            .unwrap_or(false)
    })
    .await;

    assert_eq!(w.count(&item_id, "clone_completed"), 2);
    assert_eq!(w.count(&item_id, "plan_created"), 1);
    assert_eq!(w.count(&item_id, "tasks_completed"), 2);
    assert_eq!(w.count(&item_id, "pr_created"), 2);
    assert_eq!(w.count(&item_id, "repo_no_changes"), 0);
    assert_eq!(w.count(&item_id, "review_findings_extracted"), 0);

    // Both dev agents ran in their own repo workspaces.
    let spawned = w.adapter.spawned();
    let dev_dirs: Vec<_> = spawned
        .iter()
        .filter(|s| matches!(s.agent_id.role(), Some("front") | Some("back")))
        .map(|s| s.workdir.clone())
        .collect();
    assert_eq!(dev_dirs.len(), 2);
    assert!(dev_dirs.contains(&w.layout.repo_workspace(&item_id, "frontend")));
    assert!(dev_dirs.contains(&w.layout.repo_workspace(&item_id, "backend")));
}
