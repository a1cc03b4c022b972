//! Symbolic transition systems over finite-domain variables.
//!
//! Every variable is log-encoded into BDD variables, least significant bit
//! first. State variables get a present and a next copy of each bit, placed
//! next to each other in the variable order; input variables only have a
//! present copy. Encodings outside a variable's domain are excluded by
//! validity constraints that are folded into the initial states and the
//! transition relation, so every set handed out by the engine only contains
//! valid states.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::algebra::SymbolicEngine;
use crate::bdd::Bdd;
use crate::config::BddConfig;
use crate::error::EngineError;
use crate::formula::{CmpOp, Formula, Operand};
use crate::reference::Ref;
use crate::trace::Valuation;

/// Widest supported domain, in encoding bits.
///
/// Predicates over a variable are built value by value, so the domain has to
/// stay enumerable.
pub const MAX_DOMAIN_BITS: usize = 20;

/// Value range of a variable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Domain {
    Boolean,
    /// Integers `lo..=hi`.
    Range { lo: i64, hi: i64 },
}

impl Domain {
    fn lo(&self) -> i64 {
        match *self {
            Domain::Boolean => 0,
            Domain::Range { lo, .. } => lo,
        }
    }

    fn hi(&self) -> i64 {
        match *self {
            Domain::Boolean => 1,
            Domain::Range { hi, .. } => hi,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo() <= value && value <= self.hi()
    }

    pub fn values(&self) -> impl Iterator<Item = i64> {
        self.lo()..=self.hi()
    }

    fn span(&self) -> u64 {
        (self.hi() as i128 - self.lo() as i128) as u64
    }

    fn num_bits(&self) -> usize {
        ((u64::BITS - self.span().leading_zeros()) as usize).max(1)
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Domain::Boolean)
    }

    fn render(&self, value: i64) -> String {
        match self {
            Domain::Boolean if value != 0 => "TRUE".to_string(),
            Domain::Boolean => "FALSE".to_string(),
            Domain::Range { .. } => value.to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum VarKind {
    State,
    Input,
}

#[derive(Debug, Clone)]
struct VarInfo {
    name: String,
    domain: Domain,
    kind: VarKind,
    /// Present-state bits, least significant first.
    bits: Vec<u32>,
    /// Next-state bits; empty for inputs.
    next_bits: Vec<u32>,
}

/// A concrete point of a symbolic set: a full assignment of some block of
/// BDD variables, kept both as a cube and as its literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minterm {
    cube: Ref,
    literals: Vec<i32>,
}

/// A symbolic transition system: initial states `I(s)` and a transition
/// relation `T(s, i, s')` over present state, input and next state.
pub struct TransitionSystem {
    bdd: Rc<Bdd>,
    vars: Vec<VarInfo>,
    index: HashMap<String, usize>,
    next_id: u32,
    initial: Ref,
    transition: Ref,
    valid_present: Ref,
    valid_next: Ref,
    valid_inputs: Ref,
    present_to_next: HashMap<u32, u32>,
    next_to_present: HashMap<u32, u32>,
}

impl TransitionSystem {
    pub fn new(bdd: Rc<Bdd>) -> Self {
        let one = bdd.one;
        TransitionSystem {
            bdd,
            vars: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            initial: one,
            transition: one,
            valid_present: one,
            valid_next: one,
            valid_inputs: one,
            present_to_next: HashMap::new(),
            next_to_present: HashMap::new(),
        }
    }

    pub fn with_config(config: BddConfig) -> Self {
        Self::new(Rc::new(Bdd::with_config(config)))
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    /// Names of the state variables, in declaration order.
    pub fn state_vars(&self) -> impl Iterator<Item = &str> + '_ {
        self.vars
            .iter()
            .filter(|v| v.kind == VarKind::State)
            .map(|v| v.name.as_str())
    }

    /// Names of the input variables, in declaration order.
    pub fn input_vars(&self) -> impl Iterator<Item = &str> + '_ {
        self.vars
            .iter()
            .filter(|v| v.kind == VarKind::Input)
            .map(|v| v.name.as_str())
    }

    fn check_new(&self, name: &str, domain: Domain) -> Result<(), EngineError> {
        if self.index.contains_key(name) {
            return Err(EngineError::DuplicateVariable(name.to_string()));
        }
        if let Domain::Range { lo, hi } = domain {
            if lo > hi {
                return Err(EngineError::EmptyDomain {
                    name: name.to_string(),
                    lo,
                    hi,
                });
            }
        }
        if domain.num_bits() > MAX_DOMAIN_BITS {
            return Err(EngineError::DomainTooWide {
                name: name.to_string(),
                bits: domain.num_bits(),
                max: MAX_DOMAIN_BITS,
            });
        }
        Ok(())
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Disjunction of the encodings of all domain values.
    fn valid_encodings(&self, domain: Domain, bits: &[u32]) -> Ref {
        if domain.span() + 1 == 1u64 << bits.len() {
            return self.bdd.one;
        }
        self.bdd
            .apply_or_many((0..=domain.span()).map(|offset| self.offset_cube(bits, offset)))
    }

    fn offset_cube(&self, bits: &[u32], offset: u64) -> Ref {
        self.bdd.cube(bits.iter().enumerate().map(|(i, &b)| {
            if (offset >> i) & 1 == 1 {
                b as i32
            } else {
                -(b as i32)
            }
        }))
    }

    pub fn declare_state(&mut self, name: impl Into<String>, domain: Domain) -> Result<(), EngineError> {
        let name = name.into();
        self.check_new(&name, domain)?;

        let mut bits = Vec::new();
        let mut next_bits = Vec::new();
        for _ in 0..domain.num_bits() {
            let present = self.alloc();
            let next = self.alloc();
            self.present_to_next.insert(present, next);
            self.next_to_present.insert(next, present);
            bits.push(present);
            next_bits.push(next);
        }

        let valid = self.valid_encodings(domain, &bits);
        let valid_next = self.valid_encodings(domain, &next_bits);
        self.valid_present = self.bdd.apply_and(self.valid_present, valid);
        self.valid_next = self.bdd.apply_and(self.valid_next, valid_next);

        debug!("declared state variable {} over {:?} with bits {:?}", name, domain, bits);
        self.index.insert(name.clone(), self.vars.len());
        self.vars.push(VarInfo {
            name,
            domain,
            kind: VarKind::State,
            bits,
            next_bits,
        });
        Ok(())
    }

    pub fn declare_input(&mut self, name: impl Into<String>, domain: Domain) -> Result<(), EngineError> {
        let name = name.into();
        self.check_new(&name, domain)?;

        let bits = (0..domain.num_bits()).map(|_| self.alloc()).collect::<Vec<_>>();
        let valid = self.valid_encodings(domain, &bits);
        self.valid_inputs = self.bdd.apply_and(self.valid_inputs, valid);

        debug!("declared input variable {} over {:?} with bits {:?}", name, domain, bits);
        self.index.insert(name.clone(), self.vars.len());
        self.vars.push(VarInfo {
            name,
            domain,
            kind: VarKind::Input,
            bits,
            next_bits: Vec::new(),
        });
        Ok(())
    }

    fn var(&self, name: &str) -> Result<&VarInfo, EngineError> {
        self.index
            .get(name)
            .map(|&i| &self.vars[i])
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    fn value_cube(&self, var: &VarInfo, bits: &[u32], value: i64) -> Result<Ref, EngineError> {
        if !var.domain.contains(value) {
            return Err(EngineError::OutOfDomain {
                name: var.name.clone(),
                value,
            });
        }
        Ok(self.offset_cube(bits, (value - var.domain.lo()) as u64))
    }

    /// `name = value` over the present copy (state or input variable).
    /// Booleans take `0` and `1`.
    pub fn eq(&self, name: &str, value: i64) -> Result<Ref, EngineError> {
        let var = self.var(name)?;
        self.value_cube(var, &var.bits, value)
    }

    /// `next(name) = value`.
    pub fn next_eq(&self, name: &str, value: i64) -> Result<Ref, EngineError> {
        let var = self.var(name)?;
        if var.kind == VarKind::Input {
            return Err(EngineError::Other(format!("input variable `{}` has no next state", name)));
        }
        self.value_cube(var, &var.next_bits, value)
    }

    /// `next(name) = name`.
    pub fn unchanged(&self, name: &str) -> Result<Ref, EngineError> {
        let var = self.var(name)?;
        if var.kind == VarKind::Input {
            return Err(EngineError::Other(format!("input variable `{}` has no next state", name)));
        }
        Ok(self.bdd.apply_and_many(
            var.bits
                .iter()
                .zip(&var.next_bits)
                .map(|(&p, &n)| self.bdd.apply_eq(self.bdd.mk_var(p), self.bdd.mk_var(n))),
        ))
    }

    pub fn set_initial(&mut self, initial: Ref) {
        self.initial = initial;
    }

    pub fn set_transition(&mut self, transition: Ref) {
        self.transition = transition;
    }

    /// Initial states restricted to valid encodings.
    pub fn initial(&self) -> Ref {
        self.bdd.apply_and(self.initial, self.valid_present)
    }

    /// Transition relation restricted to valid encodings on every side.
    pub fn relation(&self) -> Ref {
        self.bdd.apply_and_many([
            self.transition,
            self.valid_present,
            self.valid_inputs,
            self.valid_next,
        ])
    }

    fn present_bits(&self) -> Vec<u32> {
        self.collect_bits(VarKind::State, |v| &v.bits)
    }

    fn next_bits(&self) -> Vec<u32> {
        self.collect_bits(VarKind::State, |v| &v.next_bits)
    }

    fn input_bits(&self) -> Vec<u32> {
        self.collect_bits(VarKind::Input, |v| &v.bits)
    }

    fn collect_bits(&self, kind: VarKind, bits: impl Fn(&VarInfo) -> &Vec<u32>) -> Vec<u32> {
        self.vars
            .iter()
            .filter(|v| v.kind == kind)
            .flat_map(|v| bits(v).iter().copied())
            .collect()
    }

    fn to_next(&self, f: Ref) -> Ref {
        self.bdd.rename_vars(f, &self.present_to_next)
    }

    fn to_present(&self, f: Ref) -> Ref {
        self.bdd.rename_vars(f, &self.next_to_present)
    }

    /// Successors: `∃s,i. S(s) ∧ T(s, i, s')`, renamed back to present variables.
    pub fn image(&self, from: Ref) -> Ref {
        let mut quantified = self.present_bits();
        quantified.extend(self.input_bits());
        let in_next = self.bdd.rel_product(from, self.relation(), &quantified);
        self.to_present(in_next)
    }

    /// Predecessors: `∃i,s'. T(s, i, s') ∧ S(s')`.
    pub fn preimage(&self, to: Ref) -> Ref {
        let mut quantified = self.next_bits();
        quantified.extend(self.input_bits());
        self.bdd.rel_product(self.relation(), self.to_next(to), &quantified)
    }

    fn minterm(&self, set: Ref, bits: &[u32]) -> Option<Minterm> {
        let literals = self.bdd.pick_minterm(set, bits)?;
        let cube = self.bdd.cube(literals.iter().copied());
        Some(Minterm { cube, literals })
    }

    fn decode(&self, minterm: &Minterm, kind: VarKind) -> Valuation {
        let assigned = minterm
            .literals
            .iter()
            .map(|&lit| (lit.unsigned_abs(), lit > 0))
            .collect::<HashMap<_, _>>();
        self.vars
            .iter()
            .filter(|v| v.kind == kind)
            .map(|v| {
                let offset = v
                    .bits
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| assigned.get(b).copied().unwrap_or(false))
                    .fold(0u64, |acc, (i, _)| acc | (1 << i));
                let value = v.domain.lo() + offset as i64;
                (v.name.clone(), v.domain.render(value))
            })
            .collect()
    }

    fn eval(&self, formula: &Formula) -> Result<Ref, EngineError> {
        let bdd = &self.bdd;
        let binary = |a: &Formula, b: &Formula| -> Result<(Ref, Ref), EngineError> {
            Ok((self.eval(a)?, self.eval(b)?))
        };
        Ok(match formula {
            Formula::True => bdd.one,
            Formula::False => bdd.zero,
            Formula::Atom(name) => {
                let var = self.state_var(name)?;
                if !var.domain.is_boolean() {
                    return Err(EngineError::NotBoolean(name.clone()));
                }
                bdd.mk_var(var.bits[0])
            }
            Formula::Compare(op, lhs, rhs) => self.eval_compare(*op, lhs, rhs)?,
            Formula::Not(a) => -self.eval(a)?,
            Formula::And(a, b) => {
                let (a, b) = binary(a, b)?;
                bdd.apply_and(a, b)
            }
            Formula::Or(a, b) => {
                let (a, b) = binary(a, b)?;
                bdd.apply_or(a, b)
            }
            Formula::Xor(a, b) => {
                let (a, b) = binary(a, b)?;
                bdd.apply_xor(a, b)
            }
            Formula::Xnor(a, b) | Formula::Iff(a, b) => {
                let (a, b) = binary(a, b)?;
                bdd.apply_eq(a, b)
            }
            Formula::Implies(a, b) => {
                let (a, b) = binary(a, b)?;
                bdd.apply_imply(a, b)
            }
            Formula::Next(_) | Formula::Globally(_) | Formula::Eventually(_) | Formula::Until(..) => {
                return Err(EngineError::TemporalOperator(formula.to_string()));
            }
        })
    }

    fn state_var(&self, name: &str) -> Result<&VarInfo, EngineError> {
        let var = self.var(name)?;
        if var.kind == VarKind::Input {
            return Err(EngineError::InputInStatePredicate(name.to_string()));
        }
        Ok(var)
    }

    /// Checks that a variable and a constant have compatible types.
    fn typed_constant(var: &VarInfo, constant: &Operand) -> Result<i64, EngineError> {
        match *constant {
            Operand::Int(c) if !var.domain.is_boolean() => Ok(c),
            Operand::Bool(b) if var.domain.is_boolean() => Ok(b as i64),
            Operand::Int(_) => Err(EngineError::NotInteger(var.name.clone())),
            _ => Err(EngineError::NotBoolean(var.name.clone())),
        }
    }

    fn constant_value(operand: &Operand) -> Option<i64> {
        match *operand {
            Operand::Int(c) => Some(c),
            Operand::Bool(b) => Some(b as i64),
            Operand::Var(_) => None,
        }
    }

    fn eval_compare(&self, op: CmpOp, lhs: &Operand, rhs: &Operand) -> Result<Ref, EngineError> {
        let bdd = &self.bdd;
        match (lhs, rhs) {
            (Operand::Var(a), Operand::Var(b)) => {
                let va = self.state_var(a)?;
                let vb = self.state_var(b)?;
                if va.domain.is_boolean() != vb.domain.is_boolean() {
                    let boolean = if va.domain.is_boolean() { a } else { b };
                    return Err(EngineError::NotInteger(boolean.clone()));
                }
                let mut disjuncts = Vec::new();
                for x in va.domain.values() {
                    let matching = vb.domain.values().filter(|&y| op.holds(x, y));
                    let rhs = bdd.apply_or_many(
                        matching.map(|y| self.offset_cube(&vb.bits, (y - vb.domain.lo()) as u64)),
                    );
                    let lhs = self.offset_cube(&va.bits, (x - va.domain.lo()) as u64);
                    disjuncts.push(bdd.apply_and(lhs, rhs));
                }
                Ok(bdd.apply_or_many(disjuncts))
            }
            (Operand::Var(a), constant) => {
                let var = self.state_var(a)?;
                let c = Self::typed_constant(var, constant)?;
                Ok(self.values_where(var, |x| op.holds(x, c)))
            }
            (constant, Operand::Var(b)) => {
                let var = self.state_var(b)?;
                let c = Self::typed_constant(var, constant)?;
                Ok(self.values_where(var, |y| op.holds(c, y)))
            }
            (a, b) => match (Self::constant_value(a), Self::constant_value(b)) {
                (Some(x), Some(y)) if op.holds(x, y) => Ok(bdd.one),
                (Some(_), Some(_)) => Ok(bdd.zero),
                _ => Err(EngineError::Other(format!("cannot compare {} with {}", a, b))),
            },
        }
    }

    fn values_where(&self, var: &VarInfo, predicate: impl Fn(i64) -> bool) -> Ref {
        self.bdd.apply_or_many(
            var.domain
                .values()
                .filter(|&x| predicate(x))
                .map(|x| self.offset_cube(&var.bits, (x - var.domain.lo()) as u64)),
        )
    }
}

impl fmt::Debug for TransitionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionSystem")
            .field("state_vars", &self.state_vars().collect::<Vec<_>>())
            .field("input_vars", &self.input_vars().collect::<Vec<_>>())
            .field("initial", &self.initial)
            .field("transition", &self.transition)
            .field("bdd", &self.bdd)
            .finish()
    }
}

impl SymbolicEngine for TransitionSystem {
    type Set = Ref;
    type State = Minterm;
    type Input = Minterm;

    fn initial_states(&self) -> Ref {
        self.initial()
    }

    fn post(&self, states: &Ref) -> Ref {
        self.image(*states)
    }

    fn pre(&self, states: &Ref) -> Ref {
        self.preimage(*states)
    }

    fn pre_filtered(&self, states: &Ref, guard: &Ref) -> Ref {
        let mut quantified = self.next_bits();
        quantified.extend(self.input_bits());
        let target = self.to_next(self.bdd.apply_and(*states, *guard));
        self.bdd.rel_product(self.relation(), target, &quantified)
    }

    fn empty(&self) -> Ref {
        self.bdd.zero
    }

    fn union(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_or(*a, *b)
    }

    fn intersect(&self, a: &Ref, b: &Ref) -> Ref {
        self.bdd.apply_and(*a, *b)
    }

    fn complement(&self, a: &Ref) -> Ref {
        self.bdd.apply_and(self.valid_present, -*a)
    }

    fn is_empty(&self, a: &Ref) -> bool {
        self.bdd.is_zero(*a)
    }

    fn pick_one_state(&self, states: &Ref) -> Option<Minterm> {
        self.minterm(*states, &self.present_bits())
    }

    fn state_set(&self, state: &Minterm) -> Ref {
        state.cube
    }

    fn has_inputs(&self) -> bool {
        self.vars.iter().any(|v| v.kind == VarKind::Input)
    }

    fn pick_one_input_between(&self, from: &Minterm, to: &Minterm) -> Option<Minterm> {
        if !self.has_inputs() {
            return None;
        }
        let step = self
            .bdd
            .apply_and_many([self.relation(), from.cube, self.to_next(to.cube)]);
        let mut quantified = self.present_bits();
        quantified.extend(self.next_bits());
        let inputs = self.bdd.exists(step, &quantified);
        self.minterm(inputs, &self.input_bits())
    }

    fn state_values(&self, state: &Minterm) -> Valuation {
        self.decode(state, VarKind::State)
    }

    fn input_values(&self, input: &Minterm) -> Valuation {
        self.decode(input, VarKind::Input)
    }

    fn eval_propositional(&self, formula: &Formula) -> Result<Ref, EngineError> {
        let raw = self.eval(formula)?;
        Ok(self.bdd.apply_and(raw, self.valid_present))
    }

    fn count_states(&self, states: &Ref) -> Option<u64> {
        let total = (self.next_id - 1) as usize;
        let free = total - self.present_bits().len();
        let count = self.bdd.sat_count(*states, total) >> free;
        u64::try_from(&count).ok()
    }

    fn node_count(&self, states: &Ref) -> Option<u64> {
        Some(self.bdd.size(*states))
    }
}
