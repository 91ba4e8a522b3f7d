//! Channel adapter: the engine's wire events and transport seam.
//!
//! The engine talks to its enclosing controller through two typed events:
//! inbound `SAYS` (an utterance happened, either side) and outbound
//! `NEXT_MOVES` (the moves selected for the system's next turn). The
//! [`DialogueChannel`] trait is the seam a transport implements; the
//! blocking [`receive`](DialogueChannel::receive) call in the conversation
//! driver is the system's single suspension point.

use std::collections::VecDeque;
use std::sync::mpsc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::semantics::{Move, Speaker, Utterance};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors specific to the channel layer.
#[derive(Debug, Error, Diagnostic)]
pub enum ChannelError {
    #[error("conversation channel closed")]
    #[diagnostic(
        code(ibis::channel::closed),
        help("The peer endpoint of the conversation channel was dropped mid-turn.")
    )]
    Closed,

    #[error("transport error: {message}")]
    #[diagnostic(
        code(ibis::channel::transport),
        help("The underlying transport (socket, pipe, …) failed. The conversation cannot continue.")
    )]
    Transport { message: String },
}

/// Result type for channel operations.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

// ── Wire events ─────────────────────────────────────────────────────────

/// Inbound event from the controller / speech channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EngineInput {
    /// An utterance was said, by either side. The only event the engine
    /// acts on, and only while it is parked in grounding.
    #[serde(rename = "SAYS")]
    Says(Utterance),
    /// The speech channel reported silence. Ignored by the engine.
    #[serde(rename = "ASR_NOINPUT")]
    Noinput,
}

/// Outbound event: the moves selected for the system's next turn (may be
/// empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EngineOutput {
    #[serde(rename = "NEXT_MOVES")]
    NextMoves(Vec<Move>),
}

// ── Transport seam ──────────────────────────────────────────────────────

/// Transport between one conversation and its controller.
pub trait DialogueChannel: Send {
    /// Send one outbound event to the controller.
    fn emit(&mut self, output: &EngineOutput) -> ChannelResult<()>;

    /// Block until the next inbound event arrives.
    ///
    /// `Ok(None)` means the controller hung up; the conversation should
    /// end cleanly (a conversation instance is simply discarded when its
    /// channel closes).
    fn receive(&mut self) -> ChannelResult<Option<EngineInput>>;
}

// ── In-process channel pair ─────────────────────────────────────────────

/// Engine-side endpoint of an in-process channel pair.
#[derive(Debug)]
pub struct MpscDialogueChannel {
    inputs: mpsc::Receiver<EngineInput>,
    outputs: mpsc::Sender<EngineOutput>,
}

/// Controller-side endpoint of an in-process channel pair.
#[derive(Debug)]
pub struct ControllerHandle {
    inputs: mpsc::Sender<EngineInput>,
    outputs: mpsc::Receiver<EngineOutput>,
}

impl MpscDialogueChannel {
    /// Create a connected (engine, controller) endpoint pair.
    pub fn pair() -> (Self, ControllerHandle) {
        let (input_tx, input_rx) = mpsc::channel();
        let (output_tx, output_rx) = mpsc::channel();
        (
            Self {
                inputs: input_rx,
                outputs: output_tx,
            },
            ControllerHandle {
                inputs: input_tx,
                outputs: output_rx,
            },
        )
    }
}

impl DialogueChannel for MpscDialogueChannel {
    fn emit(&mut self, output: &EngineOutput) -> ChannelResult<()> {
        self.outputs
            .send(output.clone())
            .map_err(|_| ChannelError::Closed)
    }

    fn receive(&mut self) -> ChannelResult<Option<EngineInput>> {
        Ok(self.inputs.recv().ok())
    }
}

impl ControllerHandle {
    /// Tell the engine that `speaker` said `moves`.
    pub fn says(&self, speaker: Speaker, moves: Vec<Move>) -> ChannelResult<()> {
        self.send(EngineInput::Says(Utterance::new(speaker, moves)))
    }

    /// Send a raw inbound event.
    pub fn send(&self, event: EngineInput) -> ChannelResult<()> {
        self.inputs.send(event).map_err(|_| ChannelError::Closed)
    }

    /// Block for the engine's next outbound event; `Ok(None)` once the
    /// conversation has ended.
    pub fn next_output(&self) -> ChannelResult<Option<EngineOutput>> {
        Ok(self.outputs.recv().ok())
    }
}

// ── Scripted channel ────────────────────────────────────────────────────

/// Replays a fixed script of inbound events and records every outbound
/// event, for tests: the channel "hangs up" when the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    script: VecDeque<EngineInput>,
    emitted: Vec<EngineOutput>,
}

impl ScriptedChannel {
    pub fn new(script: impl IntoIterator<Item = EngineInput>) -> Self {
        Self {
            script: script.into_iter().collect(),
            emitted: Vec::new(),
        }
    }

    /// Everything the engine emitted so far.
    pub fn emitted(&self) -> &[EngineOutput] {
        &self.emitted
    }
}

impl DialogueChannel for ScriptedChannel {
    fn emit(&mut self, output: &EngineOutput) -> ChannelResult<()> {
        self.emitted.push(output.clone());
        Ok(())
    }

    fn receive(&mut self) -> ChannelResult<Option<EngineInput>> {
        Ok(self.script.pop_front())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
