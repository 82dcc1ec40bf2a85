use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};

use crate::engine::apply_turn::{pending_view, TurnController};
use crate::engine::llm_client::NarrativeGenerator;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::game_state::GameState;
use crate::model::turn_result::TurnReport;

/// Owns the one mutable `GameState` of a session.
///
/// Commands are handled strictly one at a time off the mailbox, which is what
/// serializes turns for the session.
pub struct Engine<G> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    controller: TurnController<G>,
    state: GameState,
}

impl<G: NarrativeGenerator> Engine<G> {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        mut controller: TurnController<G>,
        token_name: &str,
    ) -> Self {
        let state = controller.new_session(token_name);
        Self {
            rx,
            tx,
            controller,
            state,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::Turn { choice, free_text } => {
                    if !self.state.game_over {
                        let _ = self.tx.send(EngineResponse::Pending(pending_view(&self.state)));
                    }

                    let report = self
                        .controller
                        .apply_turn(&self.state, &choice, free_text.as_deref());
                    self.state = report.state.clone();

                    let _ = self.tx.send(EngineResponse::TurnApplied(report));
                }

                EngineCommand::Reset { token_name } => {
                    let name = token_name.unwrap_or_else(|| self.state.token_name.clone());
                    self.state = self.controller.new_session(&name);

                    let _ = self.tx.send(EngineResponse::Snapshot(self.state.clone()));
                }

                EngineCommand::Snapshot => {
                    let _ = self.tx.send(EngineResponse::Snapshot(self.state.clone()));
                }

                EngineCommand::Shutdown => break,
            }
        }
        log::debug!("Session engine for ${} stopped", self.state.token_name);
    }
}

/// Front-end side of a session running on its own thread.
pub struct SessionHandle {
    tx: Sender<EngineCommand>,
    rx: Receiver<EngineResponse>,
    thread: Option<JoinHandle<()>>,
}

pub fn spawn_session<G>(controller: TurnController<G>, token_name: &str) -> SessionHandle
where
    G: NarrativeGenerator + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let token_name = token_name.to_string();

    let thread = thread::spawn(move || {
        let mut engine = Engine::new(cmd_rx, resp_tx, controller, &token_name);
        engine.run();
    });

    SessionHandle {
        tx: cmd_tx,
        rx: resp_rx,
        thread: Some(thread),
    }
}

impl SessionHandle {
    pub fn send(&self, cmd: EngineCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| anyhow!("session engine has stopped"))
    }

    pub fn recv(&self) -> Result<EngineResponse> {
        self.rx
            .recv()
            .map_err(|_| anyhow!("session engine has stopped"))
    }

    pub fn snapshot(&self) -> Result<GameState> {
        self.send(EngineCommand::Snapshot)?;
        loop {
            if let EngineResponse::Snapshot(state) = self.recv()? {
                return Ok(state);
            }
        }
    }

    pub fn reset(&self, token_name: Option<String>) -> Result<GameState> {
        self.send(EngineCommand::Reset { token_name })?;
        loop {
            if let EngineResponse::Snapshot(state) = self.recv()? {
                return Ok(state);
            }
        }
    }

    /// Submits a turn and blocks until it resolves. `on_pending` sees the
    /// waiting state while the generator works.
    pub fn play(
        &self,
        choice: &str,
        free_text: Option<&str>,
        mut on_pending: impl FnMut(&GameState),
    ) -> Result<TurnReport> {
        self.send(EngineCommand::Turn {
            choice: choice.to_string(),
            free_text: free_text.map(str::to_string),
        })?;
        loop {
            match self.recv()? {
                EngineResponse::Pending(state) => on_pending(&state),
                EngineResponse::TurnApplied(report) => return Ok(report),
                EngineResponse::Snapshot(_) => {}
            }
        }
    }

    pub fn shutdown(mut self) {
        let _ = self.tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
