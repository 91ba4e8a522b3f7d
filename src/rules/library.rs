//! The standard ISU rule library.
//!
//! Seventeen named rules cover move selection and integration for
//! issue-based dialogue. Each rule follows the contract in the parent
//! module: a cheap precondition over the dialogue context, and a deferred
//! effect that clones the information state and rewrites the copy. The
//! control machine decides the order rules are tried in; nothing here
//! assumes a particular cascade position beyond what the precondition
//! states.

use crate::semantics::{Action, Answer, Move, Speaker, Utterance};
use crate::state::DialogueContext;

use super::{RuleOutcome, RuleSet};

/// Install all seventeen standard rules into `set`.
pub fn install(set: &mut RuleSet) {
    set.register("select_respond", select_respond);
    set.register("select_from_plan", select_from_plan);
    set.register("select_ask", select_ask);
    set.register("select_answer", select_answer);
    set.register("select_other", select_other);
    set.register("select_dont_understand", select_dont_understand);
    set.register("clear_agenda", clear_agenda);
    set.register("get_latest_move", get_latest_move);
    set.register("integrate_usr_request", integrate_usr_request);
    set.register("integrate_sys_ask", integrate_sys_ask);
    set.register("integrate_usr_ask", integrate_usr_ask);
    set.register("integrate_answer", integrate_answer);
    set.register("integrate_greet", integrate_greet);
    set.register("downdate_qud", downdate_qud);
    set.register("find_plan", find_plan);
    set.register("remove_findout", remove_findout);
    set.register("exec_consultDB", exec_consult_db);
}

// ── Action selection ────────────────────────────────────────────────────

/// Agenda an answer: the topmost QUD question has a resolving private
/// belief that is not yet a shared commitment.
pub fn select_respond(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(question) = is.shared.topmost_qud() else {
        return RuleOutcome::NotApplicable;
    };
    let answerable = is
        .private
        .bel
        .iter()
        .any(|fact| is.domain.resolves_fact(fact, question) && !is.shared.com.contains(fact));
    if !answerable {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.private.agenda.push_front(Action::Respond);
        Ok(next)
    })
}

/// Fall back to the active plan: copy its first step onto the empty
/// agenda. The step stays on the plan; `remove_findout` consumes it once
/// it is resolved.
pub fn select_from_plan(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    if !is.private.agenda.is_empty() {
        return RuleOutcome::NotApplicable;
    }
    let Some(step) = is.private.plan.front() else {
        return RuleOutcome::NotApplicable;
    };
    let step = step.clone();
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.private.agenda.push_front(step);
        Ok(next)
    })
}

// ── Move selection ──────────────────────────────────────────────────────

/// Turn an agendaed findout (or a bare raise) into an ask move.
pub fn select_ask(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let question = match is.private.agenda.front() {
        Some(Action::Findout(q)) => q.clone(),
        Some(Action::Raise) => match is.shared.topmost_qud() {
            Some(q) => q.clone(),
            None => return RuleOutcome::NotApplicable,
        },
        _ => return RuleOutcome::NotApplicable,
    };
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.next_moves.push(Move::Ask(question));
        Ok(next)
    })
}

/// Turn an agendaed respond into an answer move carrying the resolving
/// belief.
pub fn select_answer(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    if !matches!(is.private.agenda.front(), Some(Action::Respond)) {
        return RuleOutcome::NotApplicable;
    }
    let Some(question) = is.shared.topmost_qud() else {
        return RuleOutcome::NotApplicable;
    };
    let Some(fact) = is
        .private
        .bel
        .iter()
        .find(|fact| is.domain.resolves_fact(fact, question) && !is.shared.com.contains(*fact))
    else {
        return RuleOutcome::NotApplicable;
    };
    let fact = fact.clone();
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.next_moves.push(Move::Answer(Answer::Fact(fact)));
        Ok(next)
    })
}

/// Directly expressible agenda actions: a greet action becomes a greet
/// move.
pub fn select_other(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    if !matches!(is.private.agenda.front(), Some(Action::Greet)) {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.next_moves.push(Move::Greet);
        Ok(next)
    })
}

/// Last resort when the user spoke and no selection rule produced a move:
/// admit non-understanding.
pub fn select_dont_understand(ctx: &DialogueContext) -> RuleOutcome<'_> {
    if ctx.latest_speaker != Some(Speaker::Usr) {
        return RuleOutcome::NotApplicable;
    }
    let is = &ctx.is;
    if !is.next_moves.is_empty() {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.next_moves.push(Move::DontUnderstand);
        Ok(next)
    })
}

// ── Grounding ───────────────────────────────────────────────────────────

/// Reset the agenda at the top of every update cycle.
pub fn clear_agenda(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.private.agenda.clear();
        Ok(next)
    })
}

/// Record the just-received turn as the shared last utterance.
pub fn get_latest_move(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let (Some(speaker), Some(moves)) = (ctx.latest_speaker, ctx.latest_moves.as_ref()) else {
        return RuleOutcome::NotApplicable;
    };
    let is = &ctx.is;
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.shared.lu = Some(Utterance::new(speaker, moves.clone()));
        Ok(next)
    })
}

// ── Integration ─────────────────────────────────────────────────────────

/// A bare user request starts the domain's first task plan: its steps are
/// loaded onto the agenda.
pub fn integrate_usr_request(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(lu) = ctx.latest_utterance_by(Speaker::Usr) else {
        return RuleOutcome::NotApplicable;
    };
    if !lu.mentions_request() {
        return RuleOutcome::NotApplicable;
    }
    let Some(plan) = is.domain.first_task_plan() else {
        return RuleOutcome::NotApplicable;
    };
    let steps = plan.steps.clone();
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        for step in steps.into_iter().rev() {
            next.private.agenda.push_front(step);
        }
        Ok(next)
    })
}

/// The system's own ask becomes the topmost question under discussion.
pub fn integrate_sys_ask(ctx: &DialogueContext) -> RuleOutcome<'_> {
    integrate_ask_by(ctx, Speaker::Sys)
}

/// A user ask becomes the topmost question under discussion.
pub fn integrate_usr_ask(ctx: &DialogueContext) -> RuleOutcome<'_> {
    integrate_ask_by(ctx, Speaker::Usr)
}

fn integrate_ask_by(ctx: &DialogueContext, speaker: Speaker) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(question) = ctx
        .latest_utterance_by(speaker)
        .and_then(Utterance::first_ask)
    else {
        return RuleOutcome::NotApplicable;
    };
    let question = question.clone();
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.shared.raise(question);
        Ok(next)
    })
}

/// Integrate an answer (either side) against the topmost QUD question: the
/// combined proposition becomes a shared commitment.
///
/// `combine` may fail on a sort mismatch; the error propagates out of the
/// effect and the cascade treats this rule as inapplicable.
pub fn integrate_answer(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(answer) = is.shared.lu.as_ref().and_then(Utterance::first_answer) else {
        return RuleOutcome::NotApplicable;
    };
    let Some(question) = is.shared.topmost_qud() else {
        return RuleOutcome::NotApplicable;
    };
    if !is.domain.relevant(answer, question) {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let fact = is.domain.combine(question, answer)?;
        let mut next = is.clone();
        next.shared.commit(fact);
        Ok(next)
    })
}

/// A greeting integrates without changing the state.
pub fn integrate_greet(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let greeted = is
        .shared
        .lu
        .as_ref()
        .is_some_and(Utterance::mentions_greet);
    if !greeted {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || Ok(is.clone()))
}

// ── QUD management and plan execution ───────────────────────────────────

/// Pop the topmost QUD question once a shared commitment resolves it.
pub fn downdate_qud(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(question) = is.shared.topmost_qud() else {
        return RuleOutcome::NotApplicable;
    };
    let resolved = is
        .shared
        .com
        .iter()
        .any(|fact| is.domain.resolves_fact(fact, question));
    if !resolved {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.shared.qud.remove(0);
        Ok(next)
    })
}

/// Load the domain plan whose goal issue is the topmost QUD question.
///
/// Only fires when no plan is active and the system cannot already answer
/// the question from its private beliefs.
pub fn find_plan(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    if !is.private.plan.is_empty() {
        return RuleOutcome::NotApplicable;
    }
    let Some(question) = is.shared.topmost_qud() else {
        return RuleOutcome::NotApplicable;
    };
    if is
        .private
        .bel
        .iter()
        .any(|fact| is.domain.resolves_fact(fact, question))
    {
        return RuleOutcome::NotApplicable;
    }
    let Some(plan) = is.domain.plan_for_issue(question) else {
        return RuleOutcome::NotApplicable;
    };
    let steps = plan.steps.clone();
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.private.plan = steps.into();
        Ok(next)
    })
}

/// Pop a plan-initial findout once a shared commitment resolves it.
pub fn remove_findout(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(Action::Findout(question)) = is.private.plan.front() else {
        return RuleOutcome::NotApplicable;
    };
    let resolved = is
        .shared
        .com
        .iter()
        .any(|fact| is.domain.resolves_fact(fact, question));
    if !resolved {
        return RuleOutcome::NotApplicable;
    }
    RuleOutcome::applicable(move || {
        let mut next = is.clone();
        next.private.plan.pop_front();
        Ok(next)
    })
}

/// Execute a plan-initial database consultation: look the question up over
/// everything known (beliefs plus commitments), believe the result if
/// there is one, and consume the plan step either way.
///
/// The step is consumed even on an empty result: by the time a plan
/// reaches its consult step every preceding findout has been resolved, so
/// an empty result cannot improve by retrying — and the ExecPlan cascade
/// must keep shrinking the plan to terminate.
pub fn exec_consult_db(ctx: &DialogueContext) -> RuleOutcome<'_> {
    let is = &ctx.is;
    let Some(Action::ConsultDb(question)) = is.private.plan.front() else {
        return RuleOutcome::NotApplicable;
    };
    let question = question.clone();
    RuleOutcome::applicable(move || {
        let facts = is.known_facts();
        let found = is.database.consult(&question, &facts);
        let mut next = is.clone();
        next.private.plan.pop_front();
        match found {
            Some(fact) => next.private.believe(fact),
            None => tracing::debug!(question = %question, "database had no answer"),
        }
        Ok(next)
    })
}

// ── Tests ───────────────────────────────────────────────────────────────
