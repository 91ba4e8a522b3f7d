//! The information state: one conversation's belief/plan/agenda/commitment
//! record.
//!
//! Rules never mutate a live state: each update-rule effect clones the
//! current [`InformationState`] and rewrites the copy, so preconditions are
//! always evaluated against a stable snapshot. The domain and database are
//! `Arc`-shared and immutable for the conversation's lifetime, which keeps
//! those clones cheap.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::database::Database;
use crate::domain::Domain;
use crate::semantics::{Action, Move, Proposition, Question, Speaker, Utterance};

// ── Private and shared parts ────────────────────────────────────────────

/// The system-private part of the information state.
#[derive(Debug, Clone, Default)]
pub struct PrivateState {
    /// Actions the system intends to perform next; the front has priority.
    pub agenda: VecDeque<Action>,
    /// Remaining steps of the active top-level plan, consumed front to back.
    pub plan: VecDeque<Action>,
    /// Private beliefs (set semantics), never shared until committed.
    pub bel: Vec<Proposition>,
}

impl PrivateState {
    /// Add a belief; inserting a structurally equal fact twice is a no-op.
    pub fn believe(&mut self, fact: Proposition) {
        if !self.bel.contains(&fact) {
            self.bel.push(fact);
        }
    }
}

/// The part of the information state shared by both parties.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    /// The last utterance, by either side.
    pub lu: Option<Utterance>,
    /// Questions under discussion, most salient first.
    pub qud: Vec<Question>,
    /// Commitments both parties share (set semantics).
    pub com: Vec<Proposition>,
}

impl SharedState {
    /// Push a question onto the top of QUD. Re-raising a question that is
    /// already open fronts it instead of duplicating it.
    pub fn raise(&mut self, question: Question) {
        self.qud.retain(|q| *q != question);
        self.qud.insert(0, question);
    }

    /// Add a shared commitment; inserting a structurally equal fact twice
    /// is a no-op.
    pub fn commit(&mut self, fact: Proposition) {
        if !self.com.contains(&fact) {
            self.com.push(fact);
        }
    }

    /// The topmost (most salient) question under discussion.
    pub fn topmost_qud(&self) -> Option<&Question> {
        self.qud.first()
    }
}

// ── Information state ───────────────────────────────────────────────────

/// The central record one conversation runs on.
///
/// Created once per conversation from a domain/database pair, mutated
/// exclusively through rule effects dispatched by the control machine, and
/// discarded with the conversation.
#[derive(Debug, Clone)]
pub struct InformationState {
    /// Injected at conversation start; immutable thereafter.
    pub domain: Arc<Domain>,
    /// Injected at conversation start; immutable thereafter.
    pub database: Arc<dyn Database>,
    /// Moves selected during the current Select phase; drained before the
    /// next integration.
    pub next_moves: Vec<Move>,
    pub private: PrivateState,
    pub shared: SharedState,
}

impl InformationState {
    /// A fresh state for a new conversation: empty everywhere except the
    /// fixed opening agenda (a single greet action).
    pub fn new(domain: Arc<Domain>, database: Arc<dyn Database>) -> Self {
        Self {
            domain,
            database,
            next_moves: Vec::new(),
            private: PrivateState {
                agenda: VecDeque::from([Action::Greet]),
                ..PrivateState::default()
            },
            shared: SharedState::default(),
        }
    }

    /// Everything the database may consult: private beliefs plus shared
    /// commitments, deduplicated.
    pub fn known_facts(&self) -> Vec<Proposition> {
        let mut facts = self.private.bel.clone();
        for fact in &self.shared.com {
            if !facts.contains(fact) {
                facts.push(fact.clone());
            }
        }
        facts
    }
}

// ── Total information state ─────────────────────────────────────────────

/// The control machine's working context: the information state proper
/// plus scratch fields recording the most recently received turn.
///
/// `latest_speaker`/`latest_moves` are written at grounding time, before
/// `get_latest_move` copies them into `shared.lu`; integration rules read
/// `shared.lu`.
#[derive(Debug, Clone)]
pub struct DialogueContext {
    pub is: InformationState,
    pub latest_speaker: Option<Speaker>,
    pub latest_moves: Option<Vec<Move>>,
}

impl DialogueContext {
    pub fn new(is: InformationState) -> Self {
        Self {
            is,
            latest_speaker: None,
            latest_moves: None,
        }
    }

    /// The last utterance, if it was made by `speaker`.
    pub fn latest_utterance_by(&self, speaker: Speaker) -> Option<&Utterance> {
        self.is.shared.lu.as_ref().filter(|u| u.speaker == speaker)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
