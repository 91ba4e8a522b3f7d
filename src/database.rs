//! Fact database seam.
//!
//! The engine never interprets facts itself; a [`Database`] answers a
//! question against whatever facts the conversation has accumulated.
//! Implementations are shared read-only across conversations (behind an
//! `Arc`), so they must be side-effect-free and reentrant.

use std::fmt;

use crate::semantics::{Proposition, Question};

/// Deterministic lookup over currently committed facts.
pub trait Database: Send + Sync + fmt::Debug {
    /// Look up an answer to `question` given the known `facts`.
    ///
    /// `None` means "no fact available yet" — not an error; plan logic
    /// simply proceeds without a new belief.
    fn consult(&self, question: &Question, facts: &[Proposition]) -> Option<Proposition>;
}

/// The argument of the first fact over `predicate`, if any.
///
/// The usual way for a [`Database`] implementation to pick the inputs of
/// its lookup out of the fact set.
pub fn fact_argument<'a>(facts: &'a [Proposition], predicate: &str) -> Option<&'a str> {
    facts
        .iter()
        .find(|fact| fact.predicate == predicate)
        .map(|fact| fact.argument.as_str())
}

/// A database with no facts: every consultation comes back empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDatabase;

impl Database for NullDatabase {
    fn consult(&self, _question: &Question, _facts: &[Proposition]) -> Option<Proposition> {
        None
    }
}
