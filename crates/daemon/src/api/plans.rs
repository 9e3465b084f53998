// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan artifact operations.

use super::{Api, ApiError};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{ItemId, Plan};
use gaffer_storage::{read_plan, write_plan, PlanStoreError};

impl<A: AgentAdapter> Api<A> {
    pub fn get_plan(&self, item_id: &ItemId) -> Result<Plan, ApiError> {
        self.load_item(item_id)?;
        let path = self.agents.recorder().layout().plan_path(item_id);
        match read_plan(&path) {
            Ok(plan) => Ok(plan),
            Err(PlanStoreError::NotFound(_)) => Err(ApiError::NotFound("plan".to_string())),
            Err(e) => Err(gaffer_engine::EngineError::from(e).into()),
        }
    }

    /// Raw YAML, for editing surfaces.
    pub fn get_plan_content(&self, item_id: &ItemId) -> Result<String, ApiError> {
        self.load_item(item_id)?;
        let path = self.agents.recorder().layout().plan_path(item_id);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::NotFound("plan".to_string()))
            }
            Err(e) => Err(gaffer_engine::EngineError::from(e).into()),
        }
    }

    /// Replace the plan after validating the new content against the item.
    pub fn update_plan_content(
        &self,
        item_id: &ItemId,
        content: &str,
    ) -> Result<Plan, ApiError> {
        let item = self.load_item(item_id)?;
        let plan: Plan = serde_yaml::from_str(content)
            .map_err(|e| ApiError::Validation(format!("plan does not parse: {}", e)))?;
        plan.validate(&item).map_err(|e| ApiError::Validation(e.to_string()))?;

        let path = self.agents.recorder().layout().plan_path(item_id);
        write_plan(&path, &plan).map_err(gaffer_engine::EngineError::from)?;
        Ok(plan)
    }
}
