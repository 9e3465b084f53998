// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PTY supervisor: the production [`AgentAdapter`].
//!
//! Each agent is the assistant binary spawned inside a pseudo-terminal. A
//! dedicated OS thread owns the blocking PTY reader and the child handle;
//! it feeds chunks to a tokio task that runs the per-instance state
//! machine and forwards signals to the agent manager. The output-handling
//! path never returns errors; failures become signals or tracing noise,
//! per the engine's error contract.

mod instance;
mod spawn;

use crate::{AdapterError, AgentAdapter, AgentSignal, SpawnConfig};
use async_trait::async_trait;
use gaffer_core::{AgentId, PromptUi};
use instance::{Action, InstanceState};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, ChildKiller, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Granularity of the post-send settle timer.
const TICK_INTERVAL: Duration = Duration::from_millis(500);

enum ReaderMsg {
    Chunk(String),
    Exited { exit_code: Option<i32> },
}

struct PtyAgent {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    master: Box<dyn MasterPty + Send>,
    killer: Mutex<Box<dyn ChildKiller + Send + Sync>>,
    state: Arc<Mutex<InstanceState>>,
}

/// Supervisor for assistant processes attached to PTYs.
#[derive(Clone, Default)]
pub struct PtyAdapter {
    binary_override: Option<PathBuf>,
    agents: Arc<Mutex<HashMap<AgentId, PtyAgent>>>,
}

impl PtyAdapter {
    pub fn new(binary_override: Option<PathBuf>) -> Self {
        Self { binary_override, agents: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn with_agent<T>(
        &self,
        agent_id: &AgentId,
        f: impl FnOnce(&PtyAgent) -> T,
    ) -> Result<T, AdapterError> {
        let agents = self.agents.lock();
        agents
            .get(agent_id)
            .map(f)
            .ok_or_else(|| AdapterError::NotFound(agent_id.to_string()))
    }

    fn write_bytes(
        writer: &Arc<Mutex<Box<dyn Write + Send>>>,
        bytes: &str,
    ) -> Result<(), AdapterError> {
        let mut writer = writer.lock();
        writer.write_all(bytes.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl AgentAdapter for PtyAdapter {
    async fn spawn(
        &self,
        config: SpawnConfig,
        signal_tx: mpsc::Sender<AgentSignal>,
    ) -> Result<u32, AdapterError> {
        let span = tracing::info_span!("agent.spawn", agent_id = %config.agent_id, workdir = %config.workdir.display());
        let _guard = span.enter();

        let binary = spawn::locate_binary(self.binary_override.as_deref())?;
        let pty = native_pty_system();
        let pair = pty
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| AdapterError::Pty(e.to_string()))?;

        let command = spawn::build_command(&binary, &config);
        let mut child =
            pair.slave.spawn_command(command).map_err(|e| AdapterError::Pty(e.to_string()))?;
        drop(pair.slave);

        let pid = child.process_id().unwrap_or_default();
        let killer = child.clone_killer();
        let mut reader =
            pair.master.try_clone_reader().map_err(|e| AdapterError::Pty(e.to_string()))?;
        let writer =
            pair.master.take_writer().map_err(|e| AdapterError::Pty(e.to_string()))?;

        let state = Arc::new(Mutex::new(InstanceState::new(config.workdir.clone())));
        let writer = Arc::new(Mutex::new(writer));
        let (reader_tx, reader_rx) = mpsc::channel::<ReaderMsg>(64);

        // Blocking reader thread; owns the child so it can reap the exit
        // status when the stream ends.
        let agent_id = config.agent_id.clone();
        std::thread::Builder::new()
            .name(format!("pty-read-{}", agent_id))
            .spawn(move || {
                let mut buf = [0u8; 8192];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let chunk = String::from_utf8_lossy(&buf[..n]).to_string();
                            if reader_tx.blocking_send(ReaderMsg::Chunk(chunk)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(%agent_id, error = %e, "pty read failed");
                            let _ = child.kill();
                            break;
                        }
                    }
                }
                let exit_code = match child.wait() {
                    Ok(status) => Some(status.exit_code() as i32),
                    Err(e) => {
                        tracing::warn!(%agent_id, error = %e, "child wait failed");
                        None
                    }
                };
                let _ = reader_tx.blocking_send(ReaderMsg::Exited { exit_code });
            })
            .map_err(|e| AdapterError::Pty(e.to_string()))?;

        self.agents.lock().insert(
            config.agent_id.clone(),
            PtyAgent {
                writer: writer.clone(),
                master: pair.master,
                killer: Mutex::new(killer),
                state: state.clone(),
            },
        );

        tokio::spawn(drive(
            self.agents.clone(),
            config.agent_id.clone(),
            reader_rx,
            signal_tx,
            writer,
            state,
        ));

        tracing::info!(agent_id = %config.agent_id, pid, "agent spawned");
        Ok(pid)
    }

    async fn send_input(&self, agent_id: &AgentId, input: &str) -> Result<(), AdapterError> {
        let writer = self.with_agent(agent_id, |a| a.writer.clone())?;
        let mut line = input.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        Self::write_bytes(&writer, &line)
    }

    async fn resize(
        &self,
        agent_id: &AgentId,
        cols: u16,
        rows: u16,
    ) -> Result<(), AdapterError> {
        self.with_agent(agent_id, |a| {
            a.master
                .resize(PtySize { rows, cols, pixel_width: 0, pixel_height: 0 })
                .map_err(|e| AdapterError::Pty(e.to_string()))
        })?
    }

    async fn kill(&self, agent_id: &AgentId) -> Result<(), AdapterError> {
        tracing::info!(%agent_id, "killing agent");
        self.with_agent(agent_id, |a| a.killer.lock().kill().map_err(AdapterError::Io))?
    }

    async fn process_approval(
        &self,
        agent_id: &AgentId,
        approved: bool,
        ui: Option<PromptUi>,
    ) -> Result<(), AdapterError> {
        let (writer, state) = self.with_agent(agent_id, |a| (a.writer.clone(), a.state.clone()))?;
        let action = state
            .lock()
            .process_approval(approved, ui, Instant::now())
            .map_err(|()| AdapterError::NotWaiting(agent_id.to_string()))?;
        match action {
            Action::Write(bytes) => Self::write_bytes(&writer, bytes),
            Action::Emit(_) => Ok(()),
        }
    }

    fn is_live(&self, agent_id: &AgentId) -> bool {
        self.agents.lock().contains_key(agent_id)
    }

    fn output_tail(&self, agent_id: &AgentId) -> Option<String> {
        let agents = self.agents.lock();
        agents.get(agent_id).map(|a| a.state.lock().ring().to_string())
    }
}

/// Per-agent driver: applies state-machine actions until the child exits,
/// then removes the instance from the live map.
async fn drive(
    agents: Arc<Mutex<HashMap<AgentId, PtyAgent>>>,
    agent_id: AgentId,
    mut reader_rx: mpsc::Receiver<ReaderMsg>,
    signal_tx: mpsc::Sender<AgentSignal>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    state: Arc<Mutex<InstanceState>>,
) {
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let actions: Vec<Action> = tokio::select! {
            msg = reader_rx.recv() => match msg {
                Some(ReaderMsg::Chunk(chunk)) => {
                    state.lock().handle_chunk(&chunk, Instant::now())
                }
                Some(ReaderMsg::Exited { exit_code }) => {
                    let _ = signal_tx
                        .send(AgentSignal::Exit { exit_code, signal: None })
                        .await;
                    break;
                }
                None => break,
            },
            _ = tick.tick() => {
                state.lock().tick(Instant::now()).into_iter().collect()
            }
        };

        for action in actions {
            match action {
                Action::Emit(signal) => {
                    // A closed channel means the manager went away; keep
                    // draining until exit so the child is still reaped.
                    let _ = signal_tx.send(signal).await;
                }
                Action::Write(bytes) => {
                    if let Err(e) = PtyAdapter::write_bytes(&writer, bytes) {
                        tracing::warn!(%agent_id, error = %e, "pty write failed");
                    }
                }
            }
        }
    }

    agents.lock().remove(&agent_id);
    tracing::debug!(%agent_id, "pty instance removed");
}
