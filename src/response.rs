//! Response properties `G (f -> F g)`.
//!
//! The property fails iff some reachable `f`-state starts an infinite path
//! on which `g` never holds, that is iff `reach ∩ f ∩ EG ¬g` is non-empty.
//! The witness is a shortest path to such a state followed by a cycle that
//! stays inside `EG ¬g`.

use log::{debug, info};

use crate::algebra::SymbolicEngine;
use crate::checker::{Session, Verdict};
use crate::classify::match_response;
use crate::error::{Inconsistency, Result};
use crate::fixpoint::{exists_globally, step_input};
use crate::formula::Formula;

pub fn check_response<E: SymbolicEngine>(session: &Session<'_, E>, formula: &Formula) -> Result<Verdict> {
    let Some((f, g)) = match_response(formula) else {
        return Ok(Verdict::NotApplicable);
    };

    let engine = session.engine();
    let f_set = session.eval(f)?;
    let not_g = engine.complement(&session.eval(g)?);

    let eg = exists_globally(engine, &not_g);
    let bad = engine.intersect(&f_set, &eg);
    if engine.is_empty(&bad) {
        info!("response {} holds: no f-state in EG !g", formula);
        return Ok(Verdict::Satisfied);
    }

    let reach = session.reachability();
    let reachable_bad = engine.intersect(&bad, reach.reached());
    let Some(s) = engine.pick_one_state(&reachable_bad) else {
        info!("response {} holds: bad states are unreachable", formula);
        return Ok(Verdict::Satisfied);
    };

    let mut path = reach
        .path_to(engine, &s)
        .ok_or_else(|| Inconsistency::UnreachableState.report())?;
    let s_index = path.len() - 1;
    debug!("response: bad state at depth {}", s_index);

    // Only states visited since `s` may close the loop.
    let mut visited = vec![s.clone()];
    let mut current = s;
    let loop_back = loop {
        let successors = engine.intersect(&engine.post(&engine.state_set(&current)), &eg);
        let Some(next) = engine.pick_one_state(&successors) else {
            return Err(Inconsistency::EmptyEgSuccessor.report());
        };
        let input = step_input(engine, &current, &next);
        path.push(input, next.clone());
        if let Some(k) = visited.iter().position(|v| v == &next) {
            break s_index + k;
        }
        visited.push(next.clone());
        current = next;
    };

    info!(
        "response {} violated: prefix of {} states, cycle of {} states",
        formula,
        loop_back,
        path.len() - 1 - loop_back
    );
    Ok(Verdict::Violated(path.into_trace(engine, Some(loop_back))))
}
