//! Update-rule contract and the named-rule dispatcher.
//!
//! A rule is a pure precondition over the dialogue context plus a deferred
//! effect that produces a replacement information state. Evaluating a rule
//! once yields either [`RuleOutcome::NotApplicable`] (the failed
//! precondition) or an effect thunk; the dispatcher invokes the thunk
//! exactly once. The two-step shape keeps preconditions cheap and
//! side-effect-free while effects may do real work, including database
//! consultation.
//!
//! Both control phases dispatch through the same [`RuleSet`]; a missing
//! rule name is a configuration gap, never a fault.

use std::collections::HashMap;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::domain::DomainError;
use crate::state::{DialogueContext, InformationState};

pub mod library;

// ── Errors ──────────────────────────────────────────────────────────────

/// An error raised while computing a rule effect.
///
/// The cascade boundary treats a failed effect as "rule not applicable" and
/// falls through to the next candidate; a rule error never aborts the
/// conversation.
#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),
}

/// Result type for rule effects.
pub type RuleResult<T> = std::result::Result<T, RuleError>;

// ── Rule contract ───────────────────────────────────────────────────────

/// Deferred effect of an applicable rule: computes the replacement state.
pub type Effect<'a> = Box<dyn FnOnce() -> RuleResult<InformationState> + 'a>;

/// Outcome of evaluating a rule against a context.
pub enum RuleOutcome<'a> {
    /// The precondition does not hold.
    NotApplicable,
    /// The precondition holds; the effect must be invoked exactly once.
    Applicable(Effect<'a>),
}

impl<'a> RuleOutcome<'a> {
    /// Wrap a closure as an applicable effect.
    pub fn applicable(effect: impl FnOnce() -> RuleResult<InformationState> + 'a) -> Self {
        Self::Applicable(Box::new(effect))
    }
}

/// An information-state update rule: precondition and deferred effect in
/// one call, per the contract above.
pub type UpdateRule = for<'a> fn(&'a DialogueContext) -> RuleOutcome<'a>;

// ── Rule set and dispatcher ─────────────────────────────────────────────

/// Named registry of update rules; the dispatcher both phases share.
#[derive(Default)]
pub struct RuleSet {
    rules: HashMap<String, UpdateRule>,
}

impl RuleSet {
    /// An empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled standard ISU rule library.
    pub fn standard() -> Self {
        let mut set = Self::new();
        library::install(&mut set);
        set
    }

    /// Register (or replace) a rule under `name`.
    pub fn register(&mut self, name: impl Into<String>, rule: UpdateRule) {
        self.rules.insert(name.into(), rule);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Try one rule by name against the context.
    ///
    /// Returns the replacement information state when the rule exists, its
    /// precondition holds, and its effect succeeds. A missing name and a
    /// failed effect both come back as `None` — to the cascade they are
    /// indistinguishable from a failed precondition.
    pub fn try_apply(&self, name: &str, ctx: &DialogueContext) -> Option<InformationState> {
        let Some(rule) = self.rules.get(name) else {
            trace!(rule = name, "rule not registered, treated as inapplicable");
            return None;
        };
        match rule(ctx) {
            RuleOutcome::NotApplicable => None,
            RuleOutcome::Applicable(effect) => match effect() {
                Ok(next) => {
                    debug!(rule = name, "applied update rule");
                    Some(next)
                }
                Err(err) => {
                    warn!(rule = name, error = %err, "rule effect failed, treated as inapplicable");
                    None
                }
            },
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}
