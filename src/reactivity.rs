//! Reactivity properties: conjunctions of `GF f -> GF g`.
//!
//! A conjunct fails iff some reachable cycle visits `f` and never `g`. The
//! recur set starts as the reachable `f ∧ ¬g` states and is shrunk to the
//! states that can reach it again through `¬g` states, until it is either
//! empty (the conjunct holds) or reproduces itself (it fails).

use log::{debug, info, trace};

use crate::algebra::SymbolicEngine;
use crate::checker::{Session, Verdict};
use crate::classify::match_reactivity;
use crate::error::{Inconsistency, Result};
use crate::fixpoint::{step_input, walk_back, Path};
use crate::formula::Formula;
use crate::trace::Trace;

pub fn check_reactivity<E: SymbolicEngine>(session: &Session<'_, E>, formula: &Formula) -> Result<Verdict> {
    let Some(terms) = match_reactivity(formula) else {
        return Ok(Verdict::NotApplicable);
    };

    for (i, (f, g)) in terms.into_iter().enumerate() {
        if let Some(trace) = check_term(session, f, g)? {
            info!(
                "reactivity {} violated by conjunct {} (GF {} -> GF {})",
                formula, i, f, g
            );
            return Ok(Verdict::Violated(trace));
        }
        debug!("reactivity: conjunct {} holds", i);
    }

    info!("reactivity {} holds", formula);
    Ok(Verdict::Satisfied)
}

/// Checks one `GF f -> GF g` term, returning a witness on failure.
fn check_term<E: SymbolicEngine>(session: &Session<'_, E>, f: &Formula, g: &Formula) -> Result<Option<Trace>> {
    let engine = session.engine();
    let reach = session.reachability();
    let not_g = engine.complement(&session.eval(g)?);
    let bad = engine.intersect(&session.eval(f)?, &not_g);

    let mut recur = engine.intersect(reach.reached(), &bad);
    let mut iteration = 0;
    while !engine.is_empty(&recur) {
        let (pre_reach, covers) = backward_within(engine, &recur, &not_g);
        if covers {
            debug!("reactivity: recur set stable after {} iterations", iteration);
            return witness(session, &recur, &pre_reach).map(Some);
        }
        recur = engine.intersect(&recur, &pre_reach);
        iteration += 1;
        debug!(
            "reactivity: recur iteration {}: {:?} states, {:?} nodes",
            iteration,
            engine.count_states(&recur),
            engine.node_count(&recur)
        );
    }
    Ok(None)
}

/// States that reach `recur` in one or more steps through `not_g` states.
///
/// The second component is `true` as soon as the result contains `recur`,
/// in which case the exploration stops early.
fn backward_within<E: SymbolicEngine>(engine: &E, recur: &E::Set, not_g: &E::Set) -> (E::Set, bool) {
    let mut pre_reach = engine.empty();
    let mut new = engine.intersect(&engine.pre(recur), not_g);
    while !engine.is_empty(&new) {
        pre_reach = engine.union(&pre_reach, &new);
        if engine.entails(recur, &pre_reach) {
            return (pre_reach, true);
        }
        new = engine.difference(&engine.intersect(&engine.pre(&new), not_g), &pre_reach);
    }
    (pre_reach, false)
}

/// A state of `recur` together with the forward layers, inside `pre_reach`,
/// through which it reaches itself again.
struct Knot<E: SymbolicEngine> {
    state: E::State,
    frontiers: Vec<E::Set>,
}

/// Searches `recur` for a state that reaches itself within `pre_reach`.
///
/// A failed attempt restarts from the deepest forward layer that still meets
/// `recur`, so a chain of recur states leading into a cycle costs a single
/// retry rather than one per state.
fn find_knot<E: SymbolicEngine>(
    engine: &E,
    recur: &E::Set,
    pre_reach: &E::Set,
    max_attempts: usize,
) -> Result<Knot<E>> {
    let mut s = engine
        .pick_one_state(recur)
        .ok_or_else(|| Inconsistency::EmptyPick.report())?;

    for attempt in 0..max_attempts {
        let s_set = engine.state_set(&s);
        let mut frontiers = Vec::new();
        let mut reached = engine.empty();
        let mut new = engine.intersect(&engine.post(&s_set), pre_reach);
        while !engine.is_empty(&new) {
            frontiers.push(new.clone());
            reached = engine.union(&reached, &new);
            new = engine.difference(&engine.intersect(&engine.post(&new), pre_reach), &reached);
        }

        if engine.intersects(&s_set, &engine.intersect(&reached, recur)) {
            debug!("knot found after {} attempts", attempt + 1);
            return Ok(Knot { state: s, frontiers });
        }
        trace!("knot attempt {} failed after {} layers", attempt + 1, frontiers.len());
        let deepest = frontiers
            .iter()
            .rev()
            .map(|layer| engine.intersect(layer, recur))
            .find(|candidates| !engine.is_empty(candidates))
            .ok_or_else(|| Inconsistency::EmptyPick.report())?;
        s = engine
            .pick_one_state(&deepest)
            .ok_or_else(|| Inconsistency::EmptyPick.report())?;
    }

    Err(Inconsistency::KnotNotFound {
        attempts: max_attempts,
    }
    .report())
}

/// Lasso witness: shortest prefix to a knot, then the knot's cycle.
fn witness<E: SymbolicEngine>(session: &Session<'_, E>, recur: &E::Set, pre_reach: &E::Set) -> Result<Trace> {
    let engine = session.engine();
    let Knot { state: s, frontiers } = find_knot(engine, recur, pre_reach, session.config().max_knot_attempts)?;
    let s_set = engine.state_set(&s);

    let k = frontiers
        .iter()
        .position(|layer| engine.intersects(layer, &s_set))
        .ok_or_else(|| Inconsistency::BrokenCycle.report())?;
    let back = walk_back(engine, &frontiers[..k], s.clone());
    if !engine.intersects(&engine.post(&s_set), &engine.state_set(back.first())) {
        return Err(Inconsistency::BrokenCycle.report());
    }
    let mut cycle = Path::new(s.clone());
    cycle.push(step_input(engine, &s, back.first()), back.first().clone());
    cycle.extend(back);

    let mut path = session
        .reachability()
        .path_to(engine, &s)
        .ok_or_else(|| Inconsistency::UnreachableState.report())?;
    let loop_back = path.len() - 1;
    path.extend(cycle);

    Ok(path.into_trace(engine, Some(loop_back)))
}
