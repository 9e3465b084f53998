// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn layout_is_deterministic() {
    let layout = DataLayout::new("/data");
    let item = ItemId::new("ITEM-AB12CD34");
    let agent = AgentId::new("agent-front--fe--abc123");

    assert_eq!(layout.item_dir(&item), Path::new("/data/items/ITEM-AB12CD34"));
    assert_eq!(layout.item_config(&item), Path::new("/data/items/ITEM-AB12CD34/item.yaml"));
    assert_eq!(layout.item_events(&item), Path::new("/data/items/ITEM-AB12CD34/events.jsonl"));
    assert_eq!(layout.workspace_root(&item), Path::new("/data/items/ITEM-AB12CD34/workspace"));
    assert_eq!(
        layout.repo_workspace(&item, "fe"),
        Path::new("/data/items/ITEM-AB12CD34/workspace/fe")
    );
    assert_eq!(layout.plan_path(&item), Path::new("/data/items/ITEM-AB12CD34/workspace/plan.yaml"));
    assert_eq!(
        layout.findings_path(&item, "fe"),
        Path::new("/data/items/ITEM-AB12CD34/workspace/fe/review_findings.json")
    );
    assert_eq!(
        layout.agent_events(&item, &agent),
        Path::new("/data/items/ITEM-AB12CD34/agents/agent-front--fe--abc123/events.jsonl")
    );
    assert_eq!(layout.repositories_catalog(), Path::new("/data/repositories.yaml"));
}
