//! One conversation: a dialogue-move engine driven over a channel.
//!
//! The driver owns the loop the engine itself never runs: pump the
//! engine's outbound queue into the channel, then block on the channel for
//! the next inbound event — the conversation's single suspension point.
//! With self-grounding enabled (the default), every non-empty `NEXT_MOVES`
//! the engine emits is also fed back to it as a `SAYS sys` event, playing
//! the enclosing controller's role of reporting the system's own utterance
//! once it has been realized.

use tracing::{debug, info};

use crate::channel::{DialogueChannel, EngineInput, EngineOutput};
use crate::dme::DialogueMoveEngine;
use crate::error::IbisResult;
use crate::semantics::{Speaker, Utterance};

/// Drives one [`DialogueMoveEngine`] over one [`DialogueChannel`] until
/// the channel closes.
pub struct Conversation<C: DialogueChannel> {
    engine: DialogueMoveEngine,
    channel: C,
    echo_system_moves: bool,
}

impl<C: DialogueChannel> Conversation<C> {
    pub fn new(engine: DialogueMoveEngine, channel: C) -> Self {
        Self {
            engine,
            channel,
            echo_system_moves: true,
        }
    }

    /// Disable self-grounding, for controllers that report the system's
    /// own utterances themselves (e.g. once speech synthesis completes).
    pub fn without_echo(mut self) -> Self {
        self.echo_system_moves = false;
        self
    }

    /// The engine (read-only), e.g. to inspect the state after a run.
    pub fn engine(&self) -> &DialogueMoveEngine {
        &self.engine
    }

    /// The channel (read-only).
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Drive the conversation until the channel closes.
    pub fn run(&mut self) -> IbisResult<()> {
        info!("conversation started");
        let outputs = self.engine.advance()?;
        self.flush(outputs)?;
        loop {
            let Some(event) = self.channel.receive()? else {
                info!("channel closed, ending conversation");
                return Ok(());
            };
            let outputs = self.engine.deliver(event)?;
            self.flush(outputs)?;
        }
    }

    /// Emit queued outputs. With echo on, a non-empty move set is fed back
    /// as the system's own utterance so the update phase integrates it;
    /// that delivery cannot emit further moves until the next user turn,
    /// so the recursion is one level deep.
    fn flush(&mut self, outputs: Vec<EngineOutput>) -> IbisResult<()> {
        for output in outputs {
            self.channel.emit(&output)?;
            let EngineOutput::NextMoves(moves) = &output;
            if self.echo_system_moves && !moves.is_empty() {
                debug!(moves = moves.len(), "self-grounding system turn");
                let echoed = self.engine.deliver(EngineInput::Says(Utterance::new(
                    Speaker::Sys,
                    moves.clone(),
                )))?;
                self.flush(echoed)?;
            }
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
