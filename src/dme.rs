//! The dialogue-move engine: a two-phase control machine over the total
//! information state.
//!
//! Control flow is data. Each cascading node carries an ordered list of
//! `(rule, target)` arms plus a default target; the machine tries the arms
//! top to bottom and applies exactly the first applicable rule
//! (first-match-wins). The Select phase picks the system's next moves and
//! never blocks; the Update phase integrates one received utterance and
//! parks in [`ControlNode::Grounding`] — the single point where the machine
//! waits for the outside world.
//!
//! The machine never halts while the conversation is active: Select →
//! Update → (Select | Update) → …, returning to Select exactly when the
//! user spoke last.

use std::collections::VecDeque;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::channel::{EngineInput, EngineOutput};
use crate::rules::RuleSet;
use crate::semantics::Speaker;
use crate::state::{DialogueContext, InformationState};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors specific to the control machine.
#[derive(Debug, Error, Diagnostic)]
pub enum DmeError {
    #[error("cascade budget exhausted after {steps} steps at {node:?}")]
    #[diagnostic(
        code(ibis::dme::cascade_budget),
        help(
            "A custom control graph or rule set is cycling without making progress. \
             Every arm that targets its own node must consume something (the standard \
             graph's ExecPlan arms each pop a plan step). Raise \
             `DmeConfig::max_cascade_steps` only if the dialogue legitimately needs \
             longer cascades."
        )
    )]
    CascadeBudget { steps: usize, node: ControlNode },
}

/// Result type for engine operations.
pub type DmeResult<T> = std::result::Result<T, DmeError>;

// ── Control graph ───────────────────────────────────────────────────────

/// Nodes of the two-phase control machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlNode {
    // Select phase
    SelectAction,
    SelectMove,
    SelectionDone,
    // Update phase
    UpdateInit,
    Grounding,
    Integrate,
    DowndateQud,
    LoadPlan,
    ExecPlan,
    UpdateDone,
}

/// One guarded transition: try `rule`; if it applies, go to `target`.
#[derive(Debug, Clone)]
pub struct CascadeArm {
    pub rule: String,
    pub target: ControlNode,
}

/// An ordered rule cascade with first-match-wins semantics and a default
/// transition when no arm applies.
#[derive(Debug, Clone)]
pub struct Cascade {
    pub arms: Vec<CascadeArm>,
    pub otherwise: ControlNode,
}

impl Cascade {
    /// A cascade with no arms yet, defaulting to `otherwise`.
    pub fn new(otherwise: ControlNode) -> Self {
        Self {
            arms: Vec::new(),
            otherwise,
        }
    }

    /// Append an arm.
    pub fn arm(mut self, rule: &str, target: ControlNode) -> Self {
        self.arms.push(CascadeArm {
            rule: rule.to_string(),
            target,
        });
        self
    }
}

/// The full cascade table, one entry per cascading node.
///
/// Kept as plain data so tests can inject alternate rule orderings without
/// touching control-flow code. The non-cascading nodes (`SelectionDone`,
/// `Grounding`, `LoadPlan`, `UpdateDone`) are handled structurally by the
/// engine.
#[derive(Debug, Clone)]
pub struct ControlGraph {
    pub select_action: Cascade,
    pub select_move: Cascade,
    pub update_init: Cascade,
    pub integrate: Cascade,
    pub downdate_qud: Cascade,
    pub exec_plan: Cascade,
}

impl ControlGraph {
    /// The standard ISU control graph.
    pub fn standard() -> Self {
        use ControlNode::*;
        Self {
            // The bare fallback is needed for the opening greeting turn,
            // where the greet action is already on the agenda and no
            // action-selection rule applies.
            // TODO: check whether the fallback could be subsumed by a
            // selection rule instead.
            select_action: Cascade::new(SelectMove)
                .arm("select_respond", SelectMove)
                .arm("select_from_plan", SelectMove),
            select_move: Cascade::new(SelectionDone)
                .arm("select_ask", SelectionDone)
                .arm("select_answer", SelectionDone)
                .arm("select_other", SelectionDone)
                .arm("select_dont_understand", SelectionDone),
            update_init: Cascade::new(Grounding).arm("clear_agenda", Grounding),
            integrate: Cascade::new(DowndateQud)
                .arm("integrate_usr_request", DowndateQud)
                .arm("integrate_sys_ask", DowndateQud)
                .arm("integrate_usr_ask", DowndateQud)
                .arm("integrate_answer", DowndateQud)
                .arm("integrate_greet", DowndateQud),
            downdate_qud: Cascade::new(LoadPlan)
                .arm("downdate_qud", LoadPlan)
                .arm("find_plan", LoadPlan),
            exec_plan: Cascade::new(UpdateDone)
                .arm("remove_findout", ExecPlan)
                .arm("exec_consultDB", ExecPlan),
        }
    }

    /// The cascade for `node`, if it is a cascading node.
    pub fn cascade(&self, node: ControlNode) -> Option<&Cascade> {
        match node {
            ControlNode::SelectAction => Some(&self.select_action),
            ControlNode::SelectMove => Some(&self.select_move),
            ControlNode::UpdateInit => Some(&self.update_init),
            ControlNode::Integrate => Some(&self.integrate),
            ControlNode::DowndateQud => Some(&self.downdate_qud),
            ControlNode::ExecPlan => Some(&self.exec_plan),
            _ => None,
        }
    }
}

// ── Engine ──────────────────────────────────────────────────────────────

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct DmeConfig {
    /// Upper bound on machine steps per [`DialogueMoveEngine::advance`]
    /// call. The standard graph cannot reach it — every self-looping arm
    /// consumes a plan step — so the budget only turns a mis-wired custom
    /// graph into a diagnostic instead of a hang.
    pub max_cascade_steps: usize,
}

impl Default for DmeConfig {
    fn default() -> Self {
        Self {
            max_cascade_steps: 256,
        }
    }
}

/// The dialogue-move engine: one conversation's control machine.
///
/// Owns the total information state, the rule set, the control graph, and
/// an explicit outbound queue. [`advance`](Self::advance) runs the machine
/// to its next suspension; [`deliver`](Self::deliver) hands it one inbound
/// event while it is suspended.
pub struct DialogueMoveEngine {
    rules: RuleSet,
    graph: ControlGraph,
    config: DmeConfig,
    ctx: DialogueContext,
    node: ControlNode,
    outbox: VecDeque<EngineOutput>,
}

impl DialogueMoveEngine {
    /// An engine over `state` with the standard rule library and control
    /// graph.
    pub fn new(state: InformationState) -> Self {
        Self::with_parts(
            state,
            RuleSet::standard(),
            ControlGraph::standard(),
            DmeConfig::default(),
        )
    }

    /// Fully injectable constructor: alternate rule sets and control
    /// graphs plug in here.
    pub fn with_parts(
        state: InformationState,
        rules: RuleSet,
        graph: ControlGraph,
        config: DmeConfig,
    ) -> Self {
        info!(rules = rules.len(), "starting dialogue-move engine");
        Self {
            rules,
            graph,
            config,
            ctx: DialogueContext::new(state),
            node: ControlNode::SelectAction,
            outbox: VecDeque::new(),
        }
    }

    /// The node the machine is currently parked at.
    pub fn node(&self) -> ControlNode {
        self.node
    }

    /// The total information state (read-only).
    pub fn context(&self) -> &DialogueContext {
        &self.ctx
    }

    /// The information state proper (read-only).
    pub fn state(&self) -> &InformationState {
        &self.ctx.is
    }

    /// Run the machine until it parks in `Grounding`, draining the
    /// outbound queue.
    ///
    /// Reaching `SelectionDone` queues the selected moves as a
    /// [`EngineOutput::NextMoves`] event (possibly empty). Completing the
    /// Update phase routes back to Select if and only if the user spoke
    /// last; otherwise the Update phase repeats. Never blocks.
    pub fn advance(&mut self) -> DmeResult<Vec<EngineOutput>> {
        let mut steps = 0usize;
        while self.node != ControlNode::Grounding {
            steps += 1;
            if steps > self.config.max_cascade_steps {
                return Err(DmeError::CascadeBudget {
                    steps: steps - 1,
                    node: self.node,
                });
            }
            match self.node {
                ControlNode::SelectionDone => {
                    let moves = self.ctx.is.next_moves.clone();
                    debug!(moves = moves.len(), "selection done, queueing next moves");
                    self.outbox.push_back(EngineOutput::NextMoves(moves));
                    self.node = ControlNode::UpdateInit;
                }
                ControlNode::LoadPlan => {
                    self.node = ControlNode::ExecPlan;
                }
                ControlNode::UpdateDone => {
                    self.node = if self.ctx.latest_speaker == Some(Speaker::Usr) {
                        ControlNode::SelectAction
                    } else {
                        ControlNode::UpdateInit
                    };
                    trace!(next = ?self.node, "update phase complete");
                }
                node => self.node = self.run_cascade(node),
            }
        }
        Ok(self.outbox.drain(..).collect())
    }

    /// Deliver one inbound event.
    ///
    /// Only a `SAYS` event while the machine is parked in `Grounding` has
    /// any effect: it records the speaker and moves, clears the previous
    /// turn's `next_moves`, applies `get_latest_move`, and advances the
    /// machine to its next suspension. Every other event — or any event
    /// outside `Grounding` — is ignored.
    pub fn deliver(&mut self, event: EngineInput) -> DmeResult<Vec<EngineOutput>> {
        if self.node != ControlNode::Grounding {
            trace!(node = ?self.node, "event ignored outside grounding");
            return Ok(Vec::new());
        }
        match event {
            EngineInput::Says(utterance) => {
                debug!(
                    speaker = %utterance.speaker,
                    moves = utterance.moves.len(),
                    "grounding utterance"
                );
                self.ctx.latest_speaker = Some(utterance.speaker);
                self.ctx.latest_moves = Some(utterance.moves);
                self.ctx.is.next_moves.clear();
                match self.rules.try_apply("get_latest_move", &self.ctx) {
                    Some(next) => self.ctx.is = next,
                    None => warn!("get_latest_move did not apply after grounding"),
                }
                self.node = ControlNode::Integrate;
                self.advance()
            }
            other => {
                trace!(event = ?other, "non-utterance event ignored while grounding");
                Ok(Vec::new())
            }
        }
    }

    /// Run one cascade: apply the first applicable arm and return its
    /// target, or the default when none applies.
    fn run_cascade(&mut self, node: ControlNode) -> ControlNode {
        let Some(cascade) = self.graph.cascade(node) else {
            // Unreachable with the structural nodes handled in `advance`;
            // park rather than spin if a custom graph is incomplete.
            warn!(node = ?node, "node has no cascade, parking in grounding");
            return ControlNode::Grounding;
        };
        for arm in &cascade.arms {
            if let Some(next_is) = self.rules.try_apply(&arm.rule, &self.ctx) {
                trace!(node = ?node, rule = %arm.rule, target = ?arm.target, "cascade arm fired");
                self.ctx.is = next_is;
                return arm.target;
            }
        }
        trace!(node = ?node, target = ?cascade.otherwise, "cascade fell through to default");
        cascade.otherwise
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
