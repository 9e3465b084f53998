// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory adapter for tests.
//!
//! Scripts are queued per role; each spawn of that role consumes the next
//! script. A script is a list of actions run on spawn plus queued reactions
//! to `send_input`, which is how tests model dev agents picking up review
//! feedback. Without a script the agent simply stays alive until killed.

use crate::{AdapterError, AgentAdapter, AgentSignal, SpawnConfig};
use async_trait::async_trait;
use gaffer_core::{AgentId, PromptUi};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted step.
#[derive(Debug, Clone)]
pub enum FakeAction {
    /// Write a file relative to the agent's working directory.
    WriteWorkdirFile { path: String, contents: String },
    /// Deliver a signal to the manager.
    Signal(AgentSignal),
    /// Let other tasks make progress first.
    Sleep(Duration),
}

/// Behavior for one spawn of a role.
#[derive(Debug, Clone, Default)]
pub struct FakeScript {
    pub on_spawn: Vec<FakeAction>,
    /// Reactions consumed one list per `send_input` call.
    pub on_input: VecDeque<Vec<FakeAction>>,
}

impl FakeScript {
    pub fn new(on_spawn: Vec<FakeAction>) -> Self {
        Self { on_spawn, on_input: VecDeque::new() }
    }

    pub fn with_input_reaction(mut self, actions: Vec<FakeAction>) -> Self {
        self.on_input.push_back(actions);
        self
    }

    /// A dev-agent script: signal completion right after spawn.
    pub fn tasks_completed() -> Self {
        Self::new(vec![FakeAction::Signal(AgentSignal::TasksCompleted)])
    }

    /// An agent that exits immediately with the given code.
    pub fn exits(code: i32) -> Self {
        Self::new(vec![FakeAction::Signal(AgentSignal::Exit {
            exit_code: Some(code),
            signal: None,
        })])
    }
}

struct FakeAgent {
    signal_tx: mpsc::Sender<AgentSignal>,
    workdir: PathBuf,
    script: Arc<Mutex<FakeScript>>,
    ring: String,
}

#[derive(Debug, Clone)]
pub struct SpawnRecord {
    pub agent_id: AgentId,
    pub prompt: String,
    pub workdir: PathBuf,
}

/// Scripted [`AgentAdapter`] implementation.
#[derive(Default)]
pub struct FakeAdapter {
    scripts: Mutex<HashMap<String, VecDeque<FakeScript>>>,
    live: Mutex<HashMap<AgentId, FakeAgent>>,
    spawned: Mutex<Vec<SpawnRecord>>,
    inputs: Mutex<HashMap<AgentId, Vec<String>>>,
    approvals: Mutex<Vec<(AgentId, bool)>>,
    next_pid: AtomicU32,
}

impl FakeAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { next_pid: AtomicU32::new(1000), ..Default::default() })
    }

    /// Queue a script for the next spawn of `role`.
    pub fn push_script(&self, role: &str, script: FakeScript) {
        self.scripts.lock().entry(role.to_string()).or_default().push_back(script);
    }

    /// Everything that was spawned, in order.
    pub fn spawned(&self) -> Vec<SpawnRecord> {
        self.spawned.lock().clone()
    }

    /// Inputs sent to one agent, in order.
    pub fn inputs_for(&self, agent_id: &AgentId) -> Vec<String> {
        self.inputs.lock().get(agent_id).cloned().unwrap_or_default()
    }

    /// Approval decisions processed, in order.
    pub fn approvals(&self) -> Vec<(AgentId, bool)> {
        self.approvals.lock().clone()
    }

    /// Deliver a signal as if the agent's terminal produced it.
    pub async fn emit(&self, agent_id: &AgentId, signal: AgentSignal) {
        let tx = {
            let live = self.live.lock();
            live.get(agent_id).map(|a| a.signal_tx.clone())
        };
        if let Some(tx) = tx {
            if matches!(signal, AgentSignal::Exit { .. }) {
                self.live.lock().remove(agent_id);
            }
            let _ = tx.send(signal).await;
        }
    }

    async fn run_actions(
        self: &Arc<Self>,
        agent_id: &AgentId,
        actions: Vec<FakeAction>,
    ) {
        for action in actions {
            match action {
                FakeAction::WriteWorkdirFile { path, contents } => {
                    let workdir = {
                        let live = self.live.lock();
                        live.get(agent_id).map(|a| a.workdir.clone())
                    };
                    if let Some(workdir) = workdir {
                        let target = workdir.join(&path);
                        if let Some(parent) = target.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        if let Err(e) = std::fs::write(&target, contents) {
                            tracing::warn!(%agent_id, path, error = %e, "fake write failed");
                        }
                    }
                }
                FakeAction::Signal(signal) => self.emit(agent_id, signal).await,
                FakeAction::Sleep(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[async_trait]
impl AgentAdapter for Arc<FakeAdapter> {
    async fn spawn(
        &self,
        config: SpawnConfig,
        signal_tx: mpsc::Sender<AgentSignal>,
    ) -> Result<u32, AdapterError> {
        let role = config.agent_id.role().unwrap_or_default().to_string();
        let script = self
            .scripts
            .lock()
            .get_mut(&role)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default();

        self.spawned.lock().push(SpawnRecord {
            agent_id: config.agent_id.clone(),
            prompt: config.prompt.clone(),
            workdir: config.workdir.clone(),
        });

        let on_spawn = script.on_spawn.clone();
        self.live.lock().insert(
            config.agent_id.clone(),
            FakeAgent {
                signal_tx,
                workdir: config.workdir.clone(),
                script: Arc::new(Mutex::new(script)),
                ring: String::new(),
            },
        );

        let adapter = self.clone();
        let agent_id = config.agent_id.clone();
        tokio::spawn(async move {
            adapter.run_actions(&agent_id, on_spawn).await;
        });

        Ok(self.next_pid.fetch_add(1, Ordering::Relaxed))
    }

    async fn send_input(&self, agent_id: &AgentId, input: &str) -> Result<(), AdapterError> {
        let reaction = {
            let live = self.live.lock();
            let agent = live
                .get(agent_id)
                .ok_or_else(|| AdapterError::NotFound(agent_id.to_string()))?;
            let reaction = agent.script.lock().on_input.pop_front();
            reaction
        };
        self.inputs.lock().entry(agent_id.clone()).or_default().push(input.to_string());

        if let Some(actions) = reaction {
            let adapter = self.clone();
            let agent_id = agent_id.clone();
            tokio::spawn(async move {
                adapter.run_actions(&agent_id, actions).await;
            });
        }
        Ok(())
    }

    async fn resize(&self, agent_id: &AgentId, _cols: u16, _rows: u16)
        -> Result<(), AdapterError>
    {
        if self.is_live(agent_id) {
            Ok(())
        } else {
            Err(AdapterError::NotFound(agent_id.to_string()))
        }
    }

    async fn kill(&self, agent_id: &AgentId) -> Result<(), AdapterError> {
        let tx = {
            let mut live = self.live.lock();
            live.remove(agent_id)
                .map(|a| a.signal_tx)
                .ok_or_else(|| AdapterError::NotFound(agent_id.to_string()))?
        };
        let _ = tx.send(AgentSignal::Exit { exit_code: None, signal: Some(15) }).await;
        Ok(())
    }

    async fn process_approval(
        &self,
        agent_id: &AgentId,
        approved: bool,
        _ui: Option<PromptUi>,
    ) -> Result<(), AdapterError> {
        if !self.is_live(agent_id) {
            return Err(AdapterError::NotFound(agent_id.to_string()));
        }
        self.approvals.lock().push((agent_id.clone(), approved));
        Ok(())
    }

    fn is_live(&self, agent_id: &AgentId) -> bool {
        self.live.lock().contains_key(agent_id)
    }

    fn output_tail(&self, agent_id: &AgentId) -> Option<String> {
        self.live.lock().get(agent_id).map(|a| a.ring.clone())
    }
}
