//! Witness traces.

use std::collections::BTreeMap;
use std::fmt;

/// Variable name to printed value.
pub type Valuation = BTreeMap<String, String>;

/// One element of the alternating state/input view of a [`Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    State(&'a Valuation),
    Input(&'a Valuation),
}

/// A finite execution, optionally closing into a cycle.
///
/// `inputs[i]` drives `states[i]` to `states[i + 1]`; it is empty when the
/// model has no inputs. When `loop_back` is `Some(k)`, the last state equals
/// `states[k]` and `states[k..]` is the repeating part of the execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    states: Vec<Valuation>,
    inputs: Vec<Valuation>,
    loop_back: Option<usize>,
}

impl Trace {
    pub fn new(states: Vec<Valuation>, inputs: Vec<Valuation>, loop_back: Option<usize>) -> Self {
        assert!(!states.is_empty(), "Trace should have at least one state");
        assert_eq!(inputs.len() + 1, states.len(), "One input per transition");
        if let Some(k) = loop_back {
            assert!(k + 1 < states.len(), "Loop should close on an earlier state");
        }
        Self {
            states,
            inputs,
            loop_back,
        }
    }

    pub fn states(&self) -> &[Valuation] {
        &self.states
    }

    pub fn inputs(&self) -> &[Valuation] {
        &self.inputs
    }

    pub fn loop_back(&self) -> Option<usize> {
        self.loop_back
    }

    pub fn is_lasso(&self) -> bool {
        self.loop_back.is_some()
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn last_state(&self) -> &Valuation {
        &self.states[self.states.len() - 1]
    }

    /// States before the cycle, or all of them for a finite trace.
    pub fn prefix(&self) -> &[Valuation] {
        match self.loop_back {
            Some(k) => &self.states[..k],
            None => &self.states,
        }
    }

    /// States of the cycle, the closing repetition included.
    pub fn cycle(&self) -> &[Valuation] {
        match self.loop_back {
            Some(k) => &self.states[k..],
            None => &[],
        }
    }

    /// `[state₀, input₀, state₁, …, stateₙ]`
    pub fn steps(&self) -> impl Iterator<Item = Step<'_>> + '_ {
        self.states.iter().enumerate().flat_map(move |(i, state)| {
            std::iter::once(Step::State(state)).chain(self.inputs.get(i).map(Step::Input))
        })
    }
}

struct Assignments<'a>(&'a Valuation);

impl fmt::Display for Assignments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.states.iter().enumerate() {
            if self.loop_back == Some(i) {
                writeln!(f, "-- Loop starts here --")?;
            }
            writeln!(f, "State {}: {}", i, Assignments(state))?;
            if let Some(input) = self.inputs.get(i) {
                writeln!(f, "Input: {}", Assignments(input))?;
            }
        }
        if let Some(k) = self.loop_back {
            writeln!(f, "-- Loops back to State {} --", k)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val(pairs: &[(&str, &str)]) -> Valuation {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_finite_trace() {
        let trace = Trace::new(
            vec![val(&[("x", "0")]), val(&[("x", "1")])],
            vec![Valuation::new()],
            None,
        );
        assert!(!trace.is_lasso());
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.prefix().len(), 2);
        assert!(trace.cycle().is_empty());
        assert_eq!(trace.steps().count(), 3);
        assert_eq!(
            trace.to_string(),
            "State 0: {x = 0}\nInput: {}\nState 1: {x = 1}\n"
        );
    }

    #[test]
    fn test_lasso() {
        let a = val(&[("x", "0"), ("y", "0")]);
        let b = val(&[("x", "0"), ("y", "1")]);
        let go = val(&[("go", "TRUE")]);
        let trace = Trace::new(
            vec![a.clone(), b.clone(), a.clone()],
            vec![go.clone(), go],
            Some(0),
        );
        assert!(trace.is_lasso());
        assert!(trace.prefix().is_empty());
        assert_eq!(trace.cycle(), &[a.clone(), b, a.clone()]);
        assert_eq!(trace.last_state(), &a);

        let steps = trace.steps().collect::<Vec<_>>();
        assert_eq!(steps.len(), 5);
        assert!(matches!(steps[1], Step::Input(_)));

        let text = trace.to_string();
        assert!(text.starts_with("-- Loop starts here --\nState 0: {x = 0, y = 0}\nInput: {go = TRUE}\n"));
        assert!(text.ends_with("State 2: {x = 0, y = 0}\n-- Loops back to State 0 --\n"));
    }

    #[test]
    #[should_panic(expected = "One input per transition")]
    fn test_input_count_mismatch() {
        Trace::new(vec![val(&[("x", "0")])], vec![Valuation::new()], None);
    }
}
