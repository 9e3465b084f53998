// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review loop with one fix round on the backend repository.

use super::support::*;
use gaffer_adapters::fake::FakeAction;
use gaffer_adapters::AgentSignal;
use gaffer_core::{EventKind, ItemStatus, RepoSource, RepositoryConfig};
use gaffer_daemon::api::CreateItemRequest;
use serial_test::serial;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn review_loop_with_one_fix() {
    let w = world().await;
    let be_origin = seed_origin(w.dir.path(), "backend").await;

    // Dev agent completes, then fixes once when fed findings.
    w.adapter.push_script(
        "back",
        dev_script("be-change")
            .with_input_reaction(vec![FakeAction::Signal(AgentSignal::TasksCompleted)]),
    );
    // Review: needs_fixes on iteration 1, pass on iteration 2.
    w.adapter.push_script("review", review_script(NEEDS_FIXES_FINDINGS));
    w.adapter.push_script("review", review_script(PASS_FINDINGS));

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "backend hardening".to_string(),
            description: String::new(),
            design_doc: String::new(),
            repositories: vec![RepositoryConfig {
                directory_name: "backend".to_string(),
                role: "back".to_string(),
                source: RepoSource::Remote {
                    url: be_origin.display().to_string(),
                    base_branch: None,
                    submodules: false,
                    work_branch: None,
                },
            }],
        })
        .await
        .expect("create item");
    let item_id = view.item.id.clone();

    wait_for("planner spawn", || {
        w.adapter.spawned().iter().any(|s| s.agent_id.role() == Some("planner"))
    })
    .await;
    let plan =
        plan_yaml(&item_id, &[("t1", "back", "backend"), ("r1", "review", "backend")]);
    std::fs::write(w.layout.plan_path(&item_id), plan).expect("write plan");

    wait_for("completion", || {
        w.api
            .get_item(&item_id)
            .map(|v| v.status == ItemStatus::Completed)
            .unwrap_or(false)
    })
    .await;

    // Exactly one findings extraction, carrying one major finding.
    let extractions: Vec<(u32, usize)> = w
        .events(&item_id)
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::ReviewFindingsExtracted { iteration, major_count, .. } => {
                Some((*iteration, *major_count))
            }
            _ => None,
        })
        .collect();
    assert_eq!(extractions, vec![(1, 1)]);

    // The dev agent received exactly one feedback message.
    let dev = w
        .adapter
        .spawned()
        .into_iter()
        .find(|s| s.agent_id.role() == Some("back"))
        .expect("dev agent spawned");
    let inputs = w.adapter.inputs_for(&dev.agent_id);
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].contains("connection leak"));

    assert_eq!(w.count(&item_id, "pr_created"), 1);
}
