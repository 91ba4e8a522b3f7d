//! Dialogue domain: sort tables, semantic relations, and plans.
//!
//! A [`Domain`] is the immutable per-conversation configuration: which
//! predicates exist and what sort of individual answers them, which
//! individuals exist, and which top-level goals the system has fixed plans
//! for. On top of the tables it provides the three semantic operations the
//! update rules need: `relevant`, `resolves`, and `combine`.

use std::collections::BTreeMap;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::semantics::{Action, Answer, Proposition, Question};

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors specific to domain-level semantics.
#[derive(Debug, Error, Diagnostic)]
pub enum DomainError {
    #[error("cannot combine answer \"{answer}\" with question ?{predicate}: expected sort \"{expected}\", got {actual}")]
    #[diagnostic(
        code(ibis::domain::sort_mismatch),
        help(
            "A short answer only combines with a question whose predicate expects \
             the answer's sort, and a full proposition only combines with a question \
             over the same predicate. Check the domain's predicate and individual \
             declarations."
        )
    )]
    SortMismatch {
        predicate: String,
        expected: String,
        answer: String,
        actual: String,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

// ── Plans ───────────────────────────────────────────────────────────────

/// What a plan is for: resolving an issue, or carrying out a named task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum PlanGoal {
    /// The plan exists to resolve this question.
    Issue(Question),
    /// The plan carries out a named task the user can request.
    Task(String),
}

/// A named top-level goal with its fixed action sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub goal: PlanGoal,
    pub steps: Vec<Action>,
}

impl PlanInfo {
    /// A plan that resolves `issue` via `steps`.
    pub fn for_issue(issue: Question, steps: Vec<Action>) -> Self {
        Self {
            goal: PlanGoal::Issue(issue),
            steps,
        }
    }

    /// A plan that carries out the named task via `steps`.
    pub fn for_task(task: impl Into<String>, steps: Vec<Action>) -> Self {
        Self {
            goal: PlanGoal::Task(task.into()),
            steps,
        }
    }
}

// ── Domain ──────────────────────────────────────────────────────────────

/// Immutable per-conversation dialogue domain.
///
/// Conversations share a domain read-only (behind an `Arc`); nothing here
/// mutates after construction.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    /// predicate name → sort its answers must have.
    predicates: BTreeMap<String, String>,
    /// individual name → its sort.
    individuals: BTreeMap<String, String>,
    /// Ordered top-level plans.
    plans: Vec<PlanInfo>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a predicate and the sort of individual that answers it.
    pub fn declare_predicate(&mut self, name: impl Into<String>, sort: impl Into<String>) {
        self.predicates.insert(name.into(), sort.into());
    }

    /// Declare an individual of the given sort.
    pub fn declare_individual(&mut self, name: impl Into<String>, sort: impl Into<String>) {
        self.individuals.insert(name.into(), sort.into());
    }

    /// Append a top-level plan.
    pub fn add_plan(&mut self, plan: PlanInfo) {
        self.plans.push(plan);
    }

    pub fn predicate_sort(&self, predicate: &str) -> Option<&str> {
        self.predicates.get(predicate).map(String::as_str)
    }

    pub fn individual_sort(&self, individual: &str) -> Option<&str> {
        self.individuals.get(individual).map(String::as_str)
    }

    pub fn plans(&self) -> &[PlanInfo] {
        &self.plans
    }

    /// Could `answer` address `question`? Short answers match by sort,
    /// full propositions by predicate identity.
    pub fn relevant(&self, answer: &Answer, question: &Question) -> bool {
        match answer {
            Answer::Short(individual) => {
                match (
                    self.predicate_sort(question.predicate()),
                    self.individual_sort(individual),
                ) {
                    (Some(expected), Some(actual)) => expected == actual,
                    _ => false,
                }
            }
            Answer::Fact(fact) => fact.predicate == question.predicate(),
        }
    }

    /// Does `answer` fully resolve `question`? Stricter than [`relevant`]:
    /// only a full proposition over the question's predicate resolves it.
    ///
    /// [`relevant`]: Self::relevant
    pub fn resolves(&self, answer: &Answer, question: &Question) -> bool {
        match answer {
            Answer::Fact(fact) => self.resolves_fact(fact, question),
            Answer::Short(_) => false,
        }
    }

    /// [`resolves`](Self::resolves), for an already-ground fact.
    pub fn resolves_fact(&self, fact: &Proposition, question: &Question) -> bool {
        fact.predicate == question.predicate()
    }

    /// Unify `question` with `answer` into a ground proposition.
    ///
    /// A short answer of the right sort fills the question's predicate; a
    /// full proposition over the same predicate passes through unchanged.
    /// Anything else is a sort mismatch.
    pub fn combine(&self, question: &Question, answer: &Answer) -> DomainResult<Proposition> {
        match answer {
            Answer::Fact(fact) if fact.predicate == question.predicate() => Ok(fact.clone()),
            Answer::Short(individual)
                if self.relevant(answer, question) =>
            {
                Ok(Proposition::new(question.predicate(), individual.clone()))
            }
            _ => Err(DomainError::SortMismatch {
                predicate: question.predicate().to_string(),
                expected: self
                    .predicate_sort(question.predicate())
                    .unwrap_or("<undeclared>")
                    .to_string(),
                answer: answer.to_string(),
                actual: match answer {
                    Answer::Short(individual) => self
                        .individual_sort(individual)
                        .unwrap_or("<unknown individual>")
                        .to_string(),
                    Answer::Fact(fact) => format!("proposition over {}", fact.predicate),
                },
            }),
        }
    }

    /// The plan whose goal is to resolve `question`, if any.
    pub fn plan_for_issue(&self, question: &Question) -> Option<&PlanInfo> {
        self.plans
            .iter()
            .find(|p| matches!(&p.goal, PlanGoal::Issue(q) if q == question))
    }

    /// The first plan whose goal is a task, if any.
    pub fn first_task_plan(&self) -> Option<&PlanInfo> {
        self.plans
            .iter()
            .find(|p| matches!(&p.goal, PlanGoal::Task(_)))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
