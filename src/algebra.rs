//! The state-set algebra every checker runs against.
//!
//! The checking algorithms never look inside a set: they only combine sets,
//! apply the transition relation forwards and backwards, and extract single
//! states for witnesses. [`TransitionSystem`](crate::transition::TransitionSystem)
//! is the BDD-backed implementation shipped with the crate.

use std::fmt::Debug;

use crate::error::EngineError;
use crate::formula::Formula;
use crate::trace::Valuation;

pub trait SymbolicEngine {
    /// Immutable symbolic set of states.
    type Set: Clone + PartialEq + Debug;
    /// One concrete state.
    type State: Clone + PartialEq + Debug;
    /// One concrete assignment of the input variables.
    type Input: Clone + Debug;

    fn initial_states(&self) -> Self::Set;

    /// Successors of `states`, over all inputs.
    fn post(&self, states: &Self::Set) -> Self::Set;

    /// Predecessors of `states`, over all inputs.
    fn pre(&self, states: &Self::Set) -> Self::Set;

    /// Predecessors through transitions whose target lies in `states ∩ guard`.
    fn pre_filtered(&self, states: &Self::Set, guard: &Self::Set) -> Self::Set {
        self.pre(&self.intersect(states, guard))
    }

    fn empty(&self) -> Self::Set;
    fn union(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;
    fn intersect(&self, a: &Self::Set, b: &Self::Set) -> Self::Set;
    /// Complement relative to the universe of valid states.
    fn complement(&self, a: &Self::Set) -> Self::Set;
    fn is_empty(&self, a: &Self::Set) -> bool;

    fn difference(&self, a: &Self::Set, b: &Self::Set) -> Self::Set {
        self.intersect(a, &self.complement(b))
    }

    /// `a ⊆ b`
    fn entails(&self, a: &Self::Set, b: &Self::Set) -> bool {
        self.is_empty(&self.difference(a, b))
    }

    fn intersects(&self, a: &Self::Set, b: &Self::Set) -> bool {
        !self.is_empty(&self.intersect(a, b))
    }

    /// Deterministically extract one state, or `None` for the empty set.
    fn pick_one_state(&self, states: &Self::Set) -> Option<Self::State>;

    /// The singleton set `{state}`.
    fn state_set(&self, state: &Self::State) -> Self::Set;

    fn has_inputs(&self) -> bool;

    /// An input that drives `from` to `to` in one step, if there is one.
    fn pick_one_input_between(&self, from: &Self::State, to: &Self::State) -> Option<Self::Input>;

    fn state_values(&self, state: &Self::State) -> Valuation;

    fn input_values(&self, input: &Self::Input) -> Valuation;

    /// The set of states where a temporal-free formula holds.
    fn eval_propositional(&self, formula: &Formula) -> Result<Self::Set, EngineError>;

    /// Number of states in a set, when the engine can tell.
    fn count_states(&self, _states: &Self::Set) -> Option<u64> {
        None
    }

    /// Size of the symbolic representation of a set, for progress logs.
    fn node_count(&self, _states: &Self::Set) -> Option<u64> {
        None
    }
}
