//! Core dialogue semantics: questions, propositions, moves, and actions.
//!
//! This is the closed vocabulary the whole engine operates on. A [`Move`] is
//! a communicative contribution exchanged over the wire; an [`Action`] is an
//! engine-internal operation that a plan schedules in order to eventually
//! produce moves and/or state changes. The serde forms mirror the JSON event
//! stream of the surrounding speech stack
//! (`{"type": "ask", "content": {"type": "whq", ...}}`).

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Questions ───────────────────────────────────────────────────────────

/// A typed query that can be under discussion.
///
/// Currently a single shape: a wh-question over a predicate ("which
/// individual satisfies this predicate?"). Kept as an enum so further
/// question shapes (polar, alternative) can be added without touching the
/// rule contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    /// "Which individual satisfies `predicate`?"
    Whq { predicate: String },
}

impl Question {
    /// Construct a wh-question over a predicate.
    pub fn whq(predicate: impl Into<String>) -> Self {
        Self::Whq {
            predicate: predicate.into(),
        }
    }

    /// The predicate this question ranges over.
    pub fn predicate(&self) -> &str {
        match self {
            Self::Whq { predicate } => predicate,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whq { predicate } => write!(f, "?{predicate}"),
        }
    }
}

// ── Propositions and answers ────────────────────────────────────────────

/// A ground fact: `predicate(argument)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposition {
    pub predicate: String,
    pub argument: String,
}

impl Proposition {
    pub fn new(predicate: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            argument: argument.into(),
        }
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.predicate, self.argument)
    }
}

/// Content of an answer move.
///
/// Either a full proposition, or a bare individual name — a short answer,
/// elliptical on the question currently under discussion. On the wire a
/// short answer is a JSON string and a full answer is an object, hence the
/// untagged representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Fact(Proposition),
    Short(String),
}

impl Answer {
    pub fn short(individual: impl Into<String>) -> Self {
        Self::Short(individual.into())
    }

    pub fn fact(proposition: Proposition) -> Self {
        Self::Fact(proposition)
    }

    /// The full proposition, if this is not a short answer.
    pub fn as_fact(&self) -> Option<&Proposition> {
        match self {
            Self::Fact(p) => Some(p),
            Self::Short(_) => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(p) => write!(f, "{p}"),
            Self::Short(s) => f.write_str(s),
        }
    }
}

// ── Moves ───────────────────────────────────────────────────────────────

/// One conversational contribution, by either party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Move {
    Greet,
    Request,
    /// The wire tag keeps the historic spelling of the event stream.
    #[serde(rename = "dontunderstand")]
    DontUnderstand,
    Ask(Question),
    Answer(Answer),
}

// ── Actions ─────────────────────────────────────────────────────────────

/// A planned dialogue-internal operation.
///
/// Distinct from [`Move`]: the engine executes actions (off the agenda or
/// the active plan) to produce moves and/or information-state changes. A
/// bare `Raise` re-raises the topmost question under discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Action {
    Greet,
    Respond,
    Raise,
    Findout(Question),
    #[serde(rename = "consultDB")]
    ConsultDb(Question),
}

impl Action {
    /// Plan to find the answer to `question`: raise it and keep asking
    /// until it is resolved.
    pub fn findout(question: Question) -> Self {
        Self::Findout(question)
    }

    /// Plan to look `question` up in the fact database.
    pub fn consult_db(question: Question) -> Self {
        Self::ConsultDb(question)
    }
}

// ── Speakers and utterances ─────────────────────────────────────────────

/// Which party produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Usr,
    Sys,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usr => f.write_str("usr"),
            Self::Sys => f.write_str("sys"),
        }
    }
}

/// One turn: who spoke, and the moves the utterance realized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub moves: Vec<Move>,
}

impl Utterance {
    pub fn new(speaker: Speaker, moves: Vec<Move>) -> Self {
        Self { speaker, moves }
    }

    /// The first ask move of the turn, if any.
    pub fn first_ask(&self) -> Option<&Question> {
        self.moves.iter().find_map(|m| match m {
            Move::Ask(q) => Some(q),
            _ => None,
        })
    }

    /// The first answer move of the turn, if any.
    pub fn first_answer(&self) -> Option<&Answer> {
        self.moves.iter().find_map(|m| match m {
            Move::Answer(a) => Some(a),
            _ => None,
        })
    }

    pub fn mentions_greet(&self) -> bool {
        self.moves.iter().any(|m| matches!(m, Move::Greet))
    }

    pub fn mentions_request(&self) -> bool {
        self.moves.iter().any(|m| matches!(m, Move::Request))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_move_wire_format() {
        let ask = Move::Ask(Question::whq("booking_room"));
        let json = serde_json::to_string(&ask).unwrap();
        assert_eq!(
            json,
            r#"{"type":"ask","content":{"type":"whq","predicate":"booking_room"}}"#
        );
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ask);
    }

    #[test]
    fn contentless_moves_wire_format() {
        assert_eq!(
            serde_json::to_string(&Move::Greet).unwrap(),
            r#"{"type":"greet"}"#
        );
        assert_eq!(
            serde_json::to_string(&Move::DontUnderstand).unwrap(),
            r#"{"type":"dontunderstand"}"#
        );
        // The speech stack sends explicit null content for these.
        let greet: Move = serde_json::from_str(r#"{"type":"greet","content":null}"#).unwrap();
        assert_eq!(greet, Move::Greet);
    }

    #[test]
    fn short_answer_is_a_bare_string() {
        let answer = Move::Answer(Answer::short("LT2319"));
        let json = serde_json::to_string(&answer).unwrap();
        assert_eq!(json, r#"{"type":"answer","content":"LT2319"}"#);
    }

    #[test]
    fn full_answer_is_an_object() {
        let answer = Move::Answer(Answer::fact(Proposition::new("booking_room", "G212")));
        let json = serde_json::to_string(&answer).unwrap();
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answer);
        assert!(json.contains(r#""predicate":"booking_room""#));
    }

    #[test]
    fn consult_db_action_tag() {
        let action = Action::consult_db(Question::whq("booking_room"));
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""type":"consultDB""#));
    }

    #[test]
    fn speaker_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Speaker::Usr).unwrap(), r#""usr""#);
        assert_eq!(serde_json::to_string(&Speaker::Sys).unwrap(), r#""sys""#);
    }

    #[test]
    fn utterance_move_scanning() {
        let utterance = Utterance::new(
            Speaker::Usr,
            vec![
                Move::Greet,
                Move::Ask(Question::whq("booking_room")),
                Move::Answer(Answer::short("Monday")),
            ],
        );
        assert!(utterance.mentions_greet());
        assert!(!utterance.mentions_request());
        assert_eq!(utterance.first_ask(), Some(&Question::whq("booking_room")));
        assert_eq!(utterance.first_answer(), Some(&Answer::short("Monday")));
    }

    #[test]
    fn question_display() {
        assert_eq!(Question::whq("booking_day").to_string(), "?booking_day");
    }
}
