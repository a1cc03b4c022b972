//! Reachability, the EG fixpoint and backward witness reconstruction.

use log::{debug, trace};

use crate::algebra::SymbolicEngine;
use crate::trace::{Trace, Valuation};

/// Result of a forward breadth-first exploration.
///
/// `layers[0]` holds the initial states and `layers[i]` the states first
/// reached after `i` steps. The layers are pairwise disjoint and their union
/// is `reached`.
#[derive(Debug, Clone)]
pub struct Reachability<S> {
    reached: S,
    layers: Vec<S>,
}

impl<S> Reachability<S> {
    pub fn reached(&self) -> &S {
        &self.reached
    }

    pub fn layers(&self) -> &[S] {
        &self.layers
    }

    /// Index of the first layer meeting `states`. For a single state this is
    /// its BFS distance from the initial states.
    pub fn layer_of<E>(&self, engine: &E, states: &S) -> Option<usize>
    where
        E: SymbolicEngine<Set = S>,
    {
        self.layers
            .iter()
            .position(|layer| engine.intersects(layer, states))
    }

    /// A shortest path from an initial state to `state`, or `None` when
    /// `state` is unreachable.
    pub fn path_to<E>(&self, engine: &E, state: &E::State) -> Option<Path<E>>
    where
        E: SymbolicEngine<Set = S>,
    {
        let k = self.layer_of(engine, &engine.state_set(state))?;
        Some(walk_back(engine, &self.layers[..k], state.clone()))
    }
}

/// Breadth-first forward reachability from the initial states.
pub fn forward_reachable<E: SymbolicEngine>(engine: &E) -> Reachability<E::Set> {
    let init = engine.initial_states();
    let mut reached = init.clone();
    let mut frontier = init.clone();
    let mut layers = vec![init];

    loop {
        let new = engine.difference(&engine.post(&frontier), &reached);
        if engine.is_empty(&new) {
            break;
        }
        reached = engine.union(&reached, &new);
        layers.push(new.clone());
        debug!(
            "reachability: layer {} with {:?} new states, {:?} nodes",
            layers.len() - 1,
            engine.count_states(&new),
            engine.node_count(&new)
        );
        frontier = new;
    }

    debug!(
        "reachability: {} layers, {:?} states, {:?} nodes",
        layers.len(),
        engine.count_states(&reached),
        engine.node_count(&reached)
    );
    Reachability { reached, layers }
}

/// Greatest fixpoint `Z = P ∩ pre(Z)`: the states with an infinite path that
/// stays inside `p`.
pub fn exists_globally<E: SymbolicEngine>(engine: &E, p: &E::Set) -> E::Set {
    let mut z = p.clone();
    let mut iteration = 0;
    loop {
        let next = engine.intersect(p, &engine.pre(&z));
        if next == z {
            debug!("EG converged after {} iterations", iteration);
            return z;
        }
        z = next;
        iteration += 1;
        debug!(
            "EG iteration {}: {:?} states, {:?} nodes",
            iteration,
            engine.count_states(&z),
            engine.node_count(&z)
        );
    }
}

/// A finite execution of concrete states.
///
/// `inputs[i]` connects `states[i]` to `states[i + 1]`; it is `None` when
/// the engine has no inputs.
pub struct Path<E: SymbolicEngine> {
    states: Vec<E::State>,
    inputs: Vec<Option<E::Input>>,
}

impl<E: SymbolicEngine> Path<E> {
    pub fn new(state: E::State) -> Self {
        Self {
            states: vec![state],
            inputs: Vec::new(),
        }
    }

    pub fn states(&self) -> &[E::State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> &E::State {
        &self.states[0]
    }

    pub fn last(&self) -> &E::State {
        &self.states[self.states.len() - 1]
    }

    pub fn push(&mut self, input: Option<E::Input>, state: E::State) {
        self.inputs.push(input);
        self.states.push(state);
    }

    pub fn prepend(&mut self, state: E::State, input: Option<E::Input>) {
        self.states.insert(0, state);
        self.inputs.insert(0, input);
    }

    /// Concatenate a path that starts where this one ends.
    pub fn extend(&mut self, other: Path<E>) {
        assert!(other.first() == self.last(), "Paths should share the junction state");
        self.states.extend(other.states.into_iter().skip(1));
        self.inputs.extend(other.inputs);
    }

    pub fn into_trace(self, engine: &E, loop_back: Option<usize>) -> Trace {
        let states = self.states.iter().map(|s| engine.state_values(s)).collect();
        let inputs = self
            .inputs
            .iter()
            .map(|i| i.as_ref().map(|i| engine.input_values(i)).unwrap_or_else(Valuation::new))
            .collect();
        Trace::new(states, inputs, loop_back)
    }
}

/// An input driving `from` to `to`, when the engine has inputs at all.
pub fn step_input<E: SymbolicEngine>(engine: &E, from: &E::State, to: &E::State) -> Option<E::Input> {
    if engine.has_inputs() {
        engine.pick_one_input_between(from, to)
    } else {
        None
    }
}

/// Walk from `target` backwards through `layers`, last layer first, picking
/// one predecessor per layer.
///
/// A layer without a predecessor of the current state is skipped. The path
/// ends at `target`.
pub fn walk_back<E: SymbolicEngine>(engine: &E, layers: &[E::Set], target: E::State) -> Path<E> {
    let mut path = Path::new(target);
    for (i, layer) in layers.iter().enumerate().rev() {
        let current = engine.state_set(path.first());
        let predecessors = engine.intersect(layer, &engine.pre(&current));
        let Some(pred) = engine.pick_one_state(&predecessors) else {
            trace!("walk back: no predecessor in layer {}, skipping", i);
            continue;
        };
        let input = step_input(engine, &pred, path.first());
        path.prepend(pred, input);
    }
    path
}
