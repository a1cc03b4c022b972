//! Invariant checking by forward exploration with early termination.

use log::{debug, info};

use crate::algebra::SymbolicEngine;
use crate::checker::{Session, Verdict};
use crate::classify::is_propositional;
use crate::error::Result;
use crate::fixpoint::walk_back;
use crate::formula::Formula;

/// Checks that `formula` holds in every reachable state.
///
/// Exploration stops at the first BFS layer that contains a violating state;
/// the witness is a shortest path from an initial state to it.
pub fn check_invariant<E: SymbolicEngine>(session: &Session<'_, E>, formula: &Formula) -> Result<Verdict> {
    if !is_propositional(formula) {
        debug!("invariant {} is not propositional", formula);
        return Ok(Verdict::NotApplicable);
    }

    let engine = session.engine();
    let bad = engine.complement(&session.eval(formula)?);

    let mut current = engine.initial_states();
    let mut reached = current.clone();
    let mut layers = Vec::new();

    loop {
        let violating = engine.intersect(&current, &bad);
        if let Some(state) = engine.pick_one_state(&violating) {
            info!("invariant {} violated at depth {}", formula, layers.len());
            let path = walk_back(engine, &layers, state);
            return Ok(Verdict::Violated(path.into_trace(engine, None)));
        }

        let new = engine.difference(&engine.post(&current), &reached);
        if engine.is_empty(&new) {
            info!("invariant {} holds ({} layers explored)", formula, layers.len() + 1);
            return Ok(Verdict::Satisfied);
        }

        reached = engine.union(&reached, &new);
        layers.push(current);
        current = new;
        debug!("invariant: exploring layer {}", layers.len());
    }
}
