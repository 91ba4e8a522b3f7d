//! Domain packs: TOML-defined dialogue domains.
//!
//! A domain pack bundles everything one dialogue domain declares: the
//! predicate and individual sort tables, the top-level plans, and the
//! system's opening beliefs. One pack is bundled into the binary —
//! `room-booking`, the toy course/day/room lookup — and external packs
//! load from a TOML file with the same layout.

use std::path::Path;
use std::sync::Arc;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::database::{fact_argument, Database};
use crate::domain::{Domain, PlanInfo};
use crate::semantics::{Action, Proposition, Question};
use crate::state::InformationState;

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("domain pack not found: \"{id}\"")]
    #[diagnostic(
        code(ibis::seed::not_found),
        help("List bundled packs with `ibis pack list`.")
    )]
    NotFound { id: String },

    #[error("failed to parse domain pack \"{label}\": {message}")]
    #[diagnostic(
        code(ibis::seed::parse),
        help(
            "Check the pack TOML syntax against the bundled reference at \
             data/domains/room-booking/domain.toml."
        )
    )]
    Parse { label: String, message: String },

    #[error("failed to read domain pack file: {path}")]
    #[diagnostic(code(ibis::seed::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid step op \"{op}\" in plan {plan} of pack \"{id}\"")]
    #[diagnostic(
        code(ibis::seed::bad_step),
        help(
            "Valid ops are: findout, consult_db (both need a predicate), \
             raise, greet, respond."
        )
    )]
    BadStep { id: String, plan: usize, op: String },

    #[error("plan {plan} of pack \"{id}\" must declare exactly one goal (issue or task)")]
    #[diagnostic(
        code(ibis::seed::bad_goal),
        help("Give each [[plans]] entry either `issue = \"<predicate>\"` or `task = \"<name>\"`.")
    )]
    BadGoal { id: String, plan: usize },
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;

// ── Pack data model (TOML layer) ────────────────────────────────────────

/// A domain pack as declared in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainPack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub predicates: Vec<PredicateDecl>,
    #[serde(default)]
    pub individuals: Vec<IndividualDecl>,
    #[serde(default)]
    pub plans: Vec<PlanDecl>,
    #[serde(default)]
    pub beliefs: Vec<FactDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredicateDecl {
    pub name: String,
    pub sort: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndividualDecl {
    pub name: String,
    pub sort: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactDecl {
    pub predicate: String,
    pub argument: String,
}

/// One top-level plan: exactly one goal (`issue` or `task`) plus its steps.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDecl {
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    pub steps: Vec<StepDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepDecl {
    pub op: String,
    #[serde(default)]
    pub predicate: Option<String>,
}

impl DomainPack {
    /// Parse a pack from TOML text. `label` names the source in errors
    /// (a file path, or the bundled pack id).
    pub fn parse(label: &str, text: &str) -> SeedResult<Self> {
        toml::from_str(text).map_err(|e| SeedError::Parse {
            label: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a pack from a TOML file.
    pub fn load(path: &Path) -> SeedResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Build the immutable [`Domain`] this pack declares.
    pub fn domain(&self) -> SeedResult<Domain> {
        let mut domain = Domain::new();
        for p in &self.predicates {
            domain.declare_predicate(&p.name, &p.sort);
        }
        for i in &self.individuals {
            domain.declare_individual(&i.name, &i.sort);
        }
        for (index, plan) in self.plans.iter().enumerate() {
            let steps = plan
                .steps
                .iter()
                .map(|step| self.step_action(index, step))
                .collect::<SeedResult<Vec<Action>>>()?;
            let info = match (&plan.issue, &plan.task) {
                (Some(issue), None) => PlanInfo::for_issue(Question::whq(issue), steps),
                (None, Some(task)) => PlanInfo::for_task(task, steps),
                _ => {
                    return Err(SeedError::BadGoal {
                        id: self.id.clone(),
                        plan: index,
                    });
                }
            };
            domain.add_plan(info);
        }
        Ok(domain)
    }

    /// The system's opening private beliefs.
    pub fn opening_beliefs(&self) -> Vec<Proposition> {
        self.beliefs
            .iter()
            .map(|f| Proposition::new(&f.predicate, &f.argument))
            .collect()
    }

    fn step_action(&self, plan: usize, step: &StepDecl) -> SeedResult<Action> {
        let questioned = |predicate: &Option<String>| -> SeedResult<Question> {
            predicate.as_deref().map(Question::whq).ok_or_else(|| {
                SeedError::BadStep {
                    id: self.id.clone(),
                    plan,
                    op: format!("{} (missing predicate)", step.op),
                }
            })
        };
        match step.op.as_str() {
            "findout" => Ok(Action::findout(questioned(&step.predicate)?)),
            "consult_db" => Ok(Action::consult_db(questioned(&step.predicate)?)),
            "raise" => Ok(Action::Raise),
            "greet" => Ok(Action::Greet),
            "respond" => Ok(Action::Respond),
            other => Err(SeedError::BadStep {
                id: self.id.clone(),
                plan,
                op: other.to_string(),
            }),
        }
    }
}

// ── Bundled packs ───────────────────────────────────────────────────────

const ROOM_BOOKING_TOML: &str = include_str!("../data/domains/room-booking/domain.toml");

/// All packs bundled into the binary.
pub fn bundled_packs() -> SeedResult<Vec<DomainPack>> {
    Ok(vec![DomainPack::parse("room-booking", ROOM_BOOKING_TOML)?])
}

/// Look up one bundled pack by id.
pub fn bundled(id: &str) -> SeedResult<DomainPack> {
    bundled_packs()?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| SeedError::NotFound { id: id.to_string() })
}

// ── Room-booking database ───────────────────────────────────────────────

/// The toy course/day/room lookup backing the `room-booking` pack.
///
/// Pure table logic over the committed facts; answers only the
/// `booking_room` question, and only once a course is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomBookingDb;

impl Database for RoomBookingDb {
    fn consult(&self, question: &Question, facts: &[Proposition]) -> Option<Proposition> {
        if *question != Question::whq("booking_room") {
            return None;
        }
        let course = fact_argument(facts, "booking_course")?;
        if course != "LT2319" {
            return Some(Proposition::new("booking_room", "Not the right course"));
        }
        match fact_argument(facts, "booking_day")? {
            "Monday" => Some(Proposition::new("booking_room", "G212")),
            "Thursday" => Some(Proposition::new("booking_room", "J440")),
            _ => None,
        }
    }
}

/// Ready-to-run opening state for the bundled room-booking domain.
pub fn room_booking_state() -> SeedResult<InformationState> {
    let pack = bundled("room-booking")?;
    state_from_pack(&pack, Arc::new(RoomBookingDb))
}

/// Opening state for an arbitrary pack and database: the pack's domain,
/// the fixed opening agenda, and the pack's beliefs.
pub fn state_from_pack(
    pack: &DomainPack,
    database: Arc<dyn Database>,
) -> SeedResult<InformationState> {
    let mut state = InformationState::new(Arc::new(pack.domain()?), database);
    for fact in pack.opening_beliefs() {
        state.private.believe(fact);
    }
    Ok(state)
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::Answer;

    #[test]
    fn bundled_room_booking_pack_parses() {
        let pack = bundled("room-booking").unwrap();
        assert_eq!(pack.id, "room-booking");
        assert_eq!(pack.predicates.len(), 3);
        assert_eq!(pack.individuals.len(), 4);
        assert_eq!(pack.plans.len(), 1);
    }

    #[test]
    fn unknown_bundled_pack_is_not_found() {
        assert!(matches!(
            bundled("flight-booking"),
            Err(SeedError::NotFound { .. })
        ));
    }

    #[test]
    fn pack_domain_declares_booking_plan() {
        let domain = bundled("room-booking").unwrap().domain().unwrap();
        let plan = domain
            .plan_for_issue(&Question::whq("booking_room"))
            .unwrap();
        assert_eq!(
            plan.steps,
            vec![
                Action::findout(Question::whq("booking_course")),
                Action::findout(Question::whq("booking_day")),
                Action::consult_db(Question::whq("booking_room")),
            ]
        );
        assert!(domain.relevant(&Answer::short("LT2319"), &Question::whq("booking_course")));
    }

    #[test]
    fn room_booking_state_seeds_beliefs() {
        let state = room_booking_state().unwrap();
        assert_eq!(
            state.private.bel,
            vec![Proposition::new("favorite_food", "pizza")]
        );
    }

    #[test]
    fn database_answers_by_course_and_day() {
        let db = RoomBookingDb;
        let q = Question::whq("booking_room");
        let facts = |course: &str, day: &str| {
            vec![
                Proposition::new("booking_course", course),
                Proposition::new("booking_day", day),
            ]
        };
        assert_eq!(
            db.consult(&q, &facts("LT2319", "Monday")),
            Some(Proposition::new("booking_room", "G212"))
        );
        assert_eq!(
            db.consult(&q, &facts("LT2319", "Thursday")),
            Some(Proposition::new("booking_room", "J440"))
        );
        assert_eq!(db.consult(&q, &facts("LT2319", "Friday")), None);
        assert_eq!(
            db.consult(&q, &facts("CS101", "Monday")),
            Some(Proposition::new("booking_room", "Not the right course"))
        );
    }

    #[test]
    fn database_waits_for_a_course_fact() {
        let db = RoomBookingDb;
        assert_eq!(db.consult(&Question::whq("booking_room"), &[]), None);
        assert_eq!(
            db.consult(&Question::whq("booking_day"), &[]),
            None,
            "only the booking_room question is answerable"
        );
    }

    #[test]
    fn bad_step_op_is_rejected() {
        let text = r#"
id = "broken"
name = "Broken"

[[plans]]
issue = "x"
steps = [{ op = "teleport" }]
"#;
        let pack = DomainPack::parse("broken", text).unwrap();
        assert!(matches!(pack.domain(), Err(SeedError::BadStep { .. })));
    }

    #[test]
    fn plan_without_goal_is_rejected() {
        let text = r#"
id = "broken"
name = "Broken"

[[plans]]
steps = [{ op = "raise" }]
"#;
        let pack = DomainPack::parse("broken", text).unwrap();
        assert!(matches!(pack.domain(), Err(SeedError::BadGoal { .. })));
    }

    #[test]
    fn external_pack_loads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("weather.toml");
        std::fs::write(
            &path,
            r#"
id = "weather"
name = "Weather"

[[predicates]]
name = "forecast_city"
sort = "city"

[[individuals]]
name = "Gothenburg"
sort = "city"

[[plans]]
issue = "forecast"
steps = [
    { op = "findout", predicate = "forecast_city" },
    { op = "consult_db", predicate = "forecast" },
]
"#,
        )
        .unwrap();

        let pack = DomainPack::load(&path).unwrap();
        assert_eq!(pack.id, "weather");
        let domain = pack.domain().unwrap();
        assert!(domain.plan_for_issue(&Question::whq("forecast")).is_some());
    }

    #[test]
    fn missing_pack_file_is_an_io_error() {
        let err = DomainPack::load(Path::new("/no/such/pack.toml")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }
}
