// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart with a running agent in the log and no live process.

use super::support::*;
use gaffer_adapters::fake::FakeAdapter;
use gaffer_core::{derive_agent_statuses, AgentStatus, EventKind, LinkMode, RepoSource, RepositoryConfig};
use gaffer_daemon::api::CreateItemRequest;
use gaffer_daemon::bootstrap::bootstrap_with;
use serial_test::serial;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn restart_stops_orphaned_agent() {
    let w = world().await;
    let source = w.dir.path().join("local-app");
    std::fs::create_dir_all(&source).expect("source dir");

    let view = w
        .api
        .create_item(CreateItemRequest {
            name: "orphaned".to_string(),
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
        .start_agent(&item_id, "dev", Some("work forever".to_string()))
        .await
        .expect("start agent");
    assert_eq!(w.api.get_agent(&agent_id).expect("record").status, AgentStatus::Running);

    // "Crash": a second engine boots over the same data dir with a fresh
    // adapter that has no live processes.
    let restarted = bootstrap_with(w.layout.clone(), FakeAdapter::new())
        .await
        .expect("restart bootstrap");

    let events = w.events(&item_id);
    let stops = events
        .iter()
        .filter(|e| {
            e.agent_id.as_ref() == Some(&agent_id)
                && matches!(
                    e.kind,
                    EventKind::StatusChanged { from: AgentStatus::Running, to: AgentStatus::Stopped }
                )
        })
        .count();
    assert_eq!(stops, 1);
    assert_eq!(derive_agent_statuses(&events)[&agent_id], AgentStatus::Stopped);
    assert_eq!(
        restarted.get_agent(&agent_id).expect("recovered record").status,
        AgentStatus::Stopped
    );
}
