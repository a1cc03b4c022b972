//! Checking sessions and property reports.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;

use log::{debug, info};

use crate::algebra::SymbolicEngine;
use crate::config::CheckerConfig;
use crate::error::{CheckError, EngineError, Inconsistency, Result};
use crate::fixpoint::{forward_reachable, Reachability};
use crate::formula::Formula;
use crate::trace::Trace;

/// Result of checking one formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Violated(Trace),
    /// The formula does not have the shape the checker handles.
    NotApplicable,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Invariant,
    Ltl,
}

/// A named property of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    pub formula: Formula,
}

impl Property {
    pub fn invariant(name: impl Into<String>, formula: Formula) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Invariant,
            formula,
        }
    }

    pub fn ltl(name: impl Into<String>, formula: Formula) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Ltl,
            formula,
        }
    }
}

/// What happened to one property of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfied,
    Violated(Trace),
    NotApplicable,
    InternalError(Inconsistency),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Satisfied => write!(f, "satisfied"),
            Outcome::Violated(trace) if trace.is_lasso() => {
                write!(f, "violated (lasso of {} states)", trace.len())
            }
            Outcome::Violated(trace) => write!(f, "violated ({} states)", trace.len()),
            Outcome::NotApplicable => write!(f, "not applicable"),
            Outcome::InternalError(e) => write!(f, "internal error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub property: Property,
    pub outcome: Outcome,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`: {}", self.property.name, self.property.formula, self.outcome)
    }
}

/// One checking run against a model.
///
/// The forward reachability layers are computed at most once and shared by
/// every response and reactivity check of the session. Propositional
/// formulas are evaluated at most once each, keyed by their syntax tree;
/// the cache is never evicted.
pub struct Session<'a, E: SymbolicEngine> {
    engine: &'a E,
    config: CheckerConfig,
    reachability: OnceCell<Reachability<E::Set>>,
    formulas: RefCell<HashMap<Formula, E::Set>>,
}

impl<'a, E: SymbolicEngine> Session<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self::with_config(engine, CheckerConfig::default())
    }

    pub fn with_config(engine: &'a E, config: CheckerConfig) -> Self {
        Self {
            engine,
            config,
            reachability: OnceCell::new(),
            formulas: RefCell::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &'a E {
        self.engine
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn reachability(&self) -> &Reachability<E::Set> {
        self.reachability.get_or_init(|| forward_reachable(self.engine))
    }

    /// Number of memoized formula evaluations.
    pub fn cached_formulas(&self) -> usize {
        self.formulas.borrow().len()
    }

    /// States satisfying a propositional formula.
    pub fn eval(&self, formula: &Formula) -> Result<E::Set, EngineError> {
        if !self.config.cache_formulas {
            return self.engine.eval_propositional(formula);
        }
        if let Some(set) = self.formulas.borrow().get(formula) {
            debug!("formula cache hit: {}", formula);
            return Ok(set.clone());
        }
        let set = self.engine.eval_propositional(formula)?;
        self.formulas.borrow_mut().insert(formula.clone(), set.clone());
        Ok(set)
    }

    pub fn check_invariant(&self, formula: &Formula) -> Result<Verdict> {
        crate::invariant::check_invariant(self, formula)
    }

    pub fn check_response(&self, formula: &Formula) -> Result<Verdict> {
        crate::response::check_response(self, formula)
    }

    pub fn check_reactivity(&self, formula: &Formula) -> Result<Verdict> {
        crate::reactivity::check_reactivity(self, formula)
    }

    /// Dispatch a property to the checker matching its kind and shape.
    pub fn check(&self, property: &Property) -> Result<Verdict> {
        match property.kind {
            PropertyKind::Invariant => self.check_invariant(&property.formula),
            PropertyKind::Ltl => match self.check_response(&property.formula)? {
                Verdict::NotApplicable => self.check_reactivity(&property.formula),
                verdict => Ok(verdict),
            },
        }
    }

    /// Check every property, one report each.
    ///
    /// An internal inconsistency only affects the property it was found on;
    /// an engine failure aborts the whole run.
    pub fn check_all(&self, properties: &[Property]) -> Result<Vec<Report>, EngineError> {
        let mut reports = Vec::with_capacity(properties.len());
        for property in properties {
            let outcome = match self.check(property) {
                Ok(Verdict::Satisfied) => Outcome::Satisfied,
                Ok(Verdict::Violated(trace)) => Outcome::Violated(trace),
                Ok(Verdict::NotApplicable) => Outcome::NotApplicable,
                Err(CheckError::Inconsistency(e)) => Outcome::InternalError(e),
                Err(CheckError::Engine(e)) => return Err(e),
            };
            info!("{}: {}", property.name, outcome);
            reports.push(Report {
                property: property.clone(),
                outcome,
            });
        }
        Ok(reports)
    }
}
