//! End-to-end dialogue scenarios for the bundled room-booking domain.
//!
//! These tests exercise the full machine — grounding, integration, QUD
//! management, plan execution, and move selection — the way the enclosing
//! controller would drive it: deliver utterance events, observe NEXT_MOVES.

use ibis::channel::{EngineInput, EngineOutput};
use ibis::dme::{ControlNode, DialogueMoveEngine};
use ibis::seeds;
use ibis::semantics::{Answer, Move, Proposition, Question, Speaker, Utterance};

fn booking_engine() -> DialogueMoveEngine {
    DialogueMoveEngine::new(seeds::room_booking_state().unwrap())
}

fn says(speaker: Speaker, moves: Vec<Move>) -> EngineInput {
    EngineInput::Says(Utterance::new(speaker, moves))
}

/// Unwrap a single NEXT_MOVES event.
fn only_moves(outputs: Vec<EngineOutput>) -> Vec<Move> {
    assert_eq!(outputs.len(), 1, "expected exactly one NEXT_MOVES event");
    let EngineOutput::NextMoves(moves) = outputs.into_iter().next().unwrap();
    moves
}

/// Deliver a user turn and echo the system's reply back, returning the
/// reply. This is the controller's round: SAYS usr → NEXT_MOVES → SAYS sys.
fn round(dme: &mut DialogueMoveEngine, moves: Vec<Move>) -> Vec<Move> {
    let reply = only_moves(dme.deliver(says(Speaker::Usr, moves)).unwrap());
    if !reply.is_empty() {
        let echoed = dme.deliver(says(Speaker::Sys, reply.clone())).unwrap();
        assert!(echoed.is_empty(), "a system turn must not select moves");
    }
    reply
}

#[test]
fn opening_turn_greets() {
    let mut dme = booking_engine();
    let outputs = dme.advance().unwrap();
    assert_eq!(outputs, vec![EngineOutput::NextMoves(vec![Move::Greet])]);
    assert_eq!(dme.node(), ControlNode::Grounding);
}

#[test]
fn asking_for_the_room_loads_the_findout_plan() {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();

    let reply = round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);

    // The issue is under discussion and the plan was loaded: course first,
    // then day — and no consult step has executed yet.
    let state = dme.state();
    assert!(state.shared.qud.contains(&Question::whq("booking_room")));
    assert_eq!(state.private.plan.len(), 3, "course, day, then the lookup");
    assert!(state.private.bel.iter().all(|f| f.predicate != "booking_room"));
    assert_eq!(reply, vec![Move::Ask(Question::whq("booking_course"))]);
}

/// Run the whole booking dialogue for `day`, returning the final answer.
fn booking_dialogue(course_answer: Move, day: &str) -> Vec<Move> {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();

    let ask_course = round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);
    assert_eq!(ask_course, vec![Move::Ask(Question::whq("booking_course"))]);

    let ask_day = round(&mut dme, vec![course_answer]);
    assert_eq!(ask_day, vec![Move::Ask(Question::whq("booking_day"))]);

    round(&mut dme, vec![Move::Answer(Answer::short(day))])
}

#[test]
fn booking_on_monday_answers_g212() {
    let answer = booking_dialogue(Move::Answer(Answer::short("LT2319")), "Monday");
    assert_eq!(
        answer,
        vec![Move::Answer(Answer::fact(Proposition::new(
            "booking_room",
            "G212"
        )))]
    );
}

#[test]
fn booking_on_thursday_answers_j440() {
    let answer = booking_dialogue(Move::Answer(Answer::short("LT2319")), "Thursday");
    assert_eq!(
        answer,
        vec![Move::Answer(Answer::fact(Proposition::new(
            "booking_room",
            "J440"
        )))]
    );
}

#[test]
fn booking_another_course_is_rejected_by_the_database() {
    // "CS101" is no known individual, so the user must assert the full
    // proposition; the lookup then reports the mismatch as its answer.
    let answer = booking_dialogue(
        Move::Answer(Answer::fact(Proposition::new("booking_course", "CS101"))),
        "Monday",
    );
    assert_eq!(
        answer,
        vec![Move::Answer(Answer::fact(Proposition::new(
            "booking_room",
            "Not the right course"
        )))]
    );
}

#[test]
fn irrelevant_answer_mid_plan_re_asks_the_open_question() {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);

    // "Monday" is a day, but the course question is topmost: integration
    // falls through, nothing is committed, and the plan makes the system
    // ask for the course again.
    let reply = round(&mut dme, vec![Move::Answer(Answer::short("Monday"))]);
    assert_eq!(reply, vec![Move::Ask(Question::whq("booking_course"))]);
    assert!(dme.state().shared.com.is_empty());

    // A fitting answer recovers the dialogue.
    let reply = round(&mut dme, vec![Move::Answer(Answer::short("LT2319"))]);
    assert_eq!(reply, vec![Move::Ask(Question::whq("booking_day"))]);
}

#[test]
fn unintegrable_opening_turn_is_not_understood() {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();

    // An answer with nothing under discussion integrates nowhere, and with
    // no plan or respond available the system admits non-understanding.
    let reply = round(&mut dme, vec![Move::Answer(Answer::short("Monday"))]);
    assert_eq!(reply, vec![Move::DontUnderstand]);
    assert!(dme.state().shared.com.is_empty());
}

#[test]
fn re_asking_a_resolved_question_is_downdated_immediately() {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);
    round(&mut dme, vec![Move::Answer(Answer::short("LT2319"))]);
    round(&mut dme, vec![Move::Answer(Answer::short("Monday"))]);

    let committed = dme.state().shared.com.clone();
    assert!(committed.contains(&Proposition::new("booking_room", "G212")));

    // The room is already a shared commitment: the re-raised question is
    // resolved in the same update cycle and the commitments are unchanged
    // (set semantics).
    round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);
    assert!(dme.state().shared.qud.is_empty());
    assert_eq!(dme.state().shared.com, committed);
}

#[test]
fn full_dialogue_ends_with_empty_qud_and_shared_room() {
    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    round(&mut dme, vec![Move::Ask(Question::whq("booking_room"))]);
    round(&mut dme, vec![Move::Answer(Answer::short("LT2319"))]);
    let answer = round(&mut dme, vec![Move::Answer(Answer::short("Monday"))]);
    assert_eq!(answer.len(), 1);

    let state = dme.state();
    assert!(state.shared.qud.is_empty(), "all questions resolved");
    assert!(state.private.plan.is_empty(), "plan fully executed");
    assert!(state
        .shared
        .com
        .contains(&Proposition::new("booking_room", "G212")));
    assert_eq!(dme.node(), ControlNode::Grounding);
}

#[test]
fn cascades_are_deterministic() {
    // Two engines fed the same script end in the same state with the same
    // transcript.
    let script = |dme: &mut DialogueMoveEngine| {
        let mut transcript = dme.advance().unwrap();
        dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
        for turn in [
            vec![Move::Ask(Question::whq("booking_room"))],
            vec![Move::Answer(Answer::short("LT2319"))],
            vec![Move::Answer(Answer::short("Monday"))],
        ] {
            let outputs = dme.deliver(says(Speaker::Usr, turn)).unwrap();
            let EngineOutput::NextMoves(moves) = &outputs[0];
            let moves = moves.clone();
            transcript.extend(outputs);
            if !moves.is_empty() {
                dme.deliver(says(Speaker::Sys, moves)).unwrap();
            }
        }
        transcript
    };

    let mut first = booking_engine();
    let mut second = booking_engine();
    assert_eq!(script(&mut first), script(&mut second));
    assert_eq!(first.state().shared.com, second.state().shared.com);
    assert_eq!(first.state().shared.qud, second.state().shared.qud);
}

#[test]
fn exactly_one_event_consumed_per_cycle() {
    let mut dme = booking_engine();
    dme.advance().unwrap();

    // Advancing again without input consumes nothing and emits nothing:
    // the machine is parked at its single suspension point.
    assert!(dme.advance().unwrap().is_empty());
    assert_eq!(dme.node(), ControlNode::Grounding);

    // Non-utterance events do not wake it either.
    assert!(dme.deliver(EngineInput::Noinput).unwrap().is_empty());
    assert_eq!(dme.node(), ControlNode::Grounding);

    // One SAYS event drives one full cycle back to the suspension point.
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    assert_eq!(dme.node(), ControlNode::Grounding);
}

#[test]
fn select_runs_exactly_after_user_turns() {
    let mut dme = booking_engine();
    dme.advance().unwrap();

    // System turn: the update phase repeats, nothing is selected.
    let outputs = dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    assert!(outputs.is_empty());

    // User turn: a select phase runs and produces exactly one event.
    let outputs = dme.deliver(says(Speaker::Usr, vec![Move::Greet])).unwrap();
    assert_eq!(outputs.len(), 1);
}

#[test]
fn says_events_round_trip_through_json() {
    // The wire format the enclosing controller speaks.
    let event = says(
        Speaker::Usr,
        vec![
            Move::Ask(Question::whq("booking_room")),
            Move::Answer(Answer::short("LT2319")),
        ],
    );
    let json = serde_json::to_string(&event).unwrap();
    let back: EngineInput = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);

    let mut dme = booking_engine();
    dme.advance().unwrap();
    dme.deliver(says(Speaker::Sys, vec![Move::Greet])).unwrap();
    let outputs = dme.deliver(back).unwrap();
    assert_eq!(outputs.len(), 1);
}
