// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent operations.

use super::{Api, ApiError};
use gaffer_adapters::AgentAdapter;
use gaffer_core::{is_system_role, AgentId, AgentRecord, ItemId, ROLE_PLANNER};
use gaffer_engine::prompts;

impl<A: AgentAdapter> Api<A> {
    pub fn list_agents(&self, item_id: &ItemId) -> Result<Vec<AgentRecord>, ApiError> {
        self.load_item(item_id)?;
        Ok(self.agents.list_for_item(item_id))
    }

    pub fn get_agent(&self, agent_id: &AgentId) -> Result<AgentRecord, ApiError> {
        self.agents.get(agent_id).ok_or_else(|| ApiError::NotFound(agent_id.to_string()))
    }

    /// Start an agent by role. System roles run at the workspace root;
    /// a dev role runs in the repository configured with that role.
    pub async fn start_agent(
        &self,
        item_id: &ItemId,
        role: &str,
        prompt: Option<String>,
    ) -> Result<AgentId, ApiError> {
        let item = self.load_item(item_id)?;
        let layout = self.agents.recorder().layout().clone();

        let (repo_name, workdir) = if is_system_role(role) {
            (None, layout.workspace_root(item_id))
        } else {
            let repo = item
                .repositories
                .iter()
                .find(|r| r.role == role)
                .ok_or_else(|| {
                    ApiError::Validation(format!("no repository is configured with role {}", role))
                })?;
            (
                Some(repo.directory_name.clone()),
                layout.repo_workspace(item_id, &repo.directory_name),
            )
        };

        let prompt = match prompt {
            Some(prompt) => prompt,
            None if role == ROLE_PLANNER => prompts::planner(&item),
            None => {
                return Err(ApiError::Validation(format!("role {} requires a prompt", role)))
            }
        };

        Ok(self
            .agents
            .start(item_id, role, repo_name.as_deref(), &prompt, &workdir)
            .await?)
    }

    pub async fn stop_agent(&self, agent_id: &AgentId) -> Result<(), ApiError> {
        Ok(self.agents.stop(agent_id).await?)
    }

    pub async fn send_input(&self, agent_id: &AgentId, input: &str) -> Result<(), ApiError> {
        self.get_agent(agent_id)?;
        Ok(self.agents.send_input(agent_id, input).await?)
    }

    /// Tail of the live terminal buffer (16 KiB at most).
    pub fn output_buffer(&self, agent_id: &AgentId) -> Result<String, ApiError> {
        self.get_agent(agent_id)?;
        Ok(self.agents.output_tail(agent_id).unwrap_or_default())
    }

    pub async fn resize_agent(
        &self,
        agent_id: &AgentId,
        cols: u16,
        rows: u16,
    ) -> Result<(), ApiError> {
        self.get_agent(agent_id)?;
        Ok(self.agents.resize(agent_id, cols, rows).await?)
    }
}
