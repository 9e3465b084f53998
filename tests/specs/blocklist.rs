// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A blocklisted command is auto-denied and the agent keeps going.

use super::support::*;
use gaffer_adapters::AgentSignal;
use gaffer_core::{
    pending_approvals, AgentStatus, ApprovalFlags, DecisionSource, EventKind, LinkMode,
    PromptUi, RepoSource, RepositoryConfig,
};
use gaffer_daemon::api::CreateItemRequest;
use serial_test::serial;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn blocklisted_command_is_auto_denied() {
    let w = world().await;
    let source = w.dir.path().join("local-app");
    std::fs::create_dir_all(&source).expect("source dir");

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "blocked".to_string(),
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

    let agent_id = w
        .api
        .start_agent(&item_id, "dev", Some("do risky things".to_string()))
        .await
        .expect("start agent");

    // The supervisor classified `rm -rf /tmp/../` as blocklisted, answered
    // the prompt itself, and reports the synthetic pair.
    w.adapter
        .emit(
            &agent_id,
            AgentSignal::ApprovalAutoDenied {
                command: "rm -rf /tmp/../".to_string(),
                ui: PromptUi::Yn,
                context: "Allow Bash: rm -rf /tmp/../".to_string(),
                flags: ApprovalFlags { is_destructive: true, ..Default::default() },
            },
        )
        .await;

    wait_for("decision recorded", || w.count(&item_id, "approval_decision") == 1).await;

    let events = w.events(&item_id);
    let request = events
        .iter()
        .find(|e| matches!(e.kind, EventKind::ApprovalRequested { .. }))
        .expect("request recorded");
    assert!(events.iter().any(|e| matches!(
        &e.kind,
        EventKind::ApprovalDecision { request_id, approved: false, source: DecisionSource::Auto, .. }
            if *request_id == request.id
    )));

    // Nothing pending, and the agent continues.
    assert!(pending_approvals(&events).is_empty());
    assert_eq!(
        w.api.get_agent(&agent_id).expect("agent record").status,
        AgentStatus::Running
    );
}
