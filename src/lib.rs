//! # bdd-mc: symbolic model checking on Binary Decision Diagrams
//!
//! **`bdd-mc`** decides invariant, response and reactivity properties of
//! finite-state transition systems, and explains every violation with a
//! concrete witness trace.
//!
//! ## Property classes
//!
//! - **Invariants**: a propositional formula that must hold in every
//!   reachable state. Violations come with a shortest path to a bad state.
//! - **Response** `G (f -> F g)`: every `f` is eventually followed by `g`.
//!   Violations are lassos: a path to an `f`-state, then a cycle on which `g`
//!   never holds.
//! - **Reactivity** `(GF f1 -> GF g1) & (GF f2 -> GF g2) & ...`: whenever
//!   `f_i` holds infinitely often, so does `g_i`. Violations are lassos whose
//!   cycle visits `f_i` and avoids `g_i`.
//!
//! ## Architecture
//!
//! The algorithms in [`fixpoint`], [`invariant`], [`response`] and
//! [`reactivity`] only talk to the [`SymbolicEngine`][crate::algebra::SymbolicEngine]
//! trait. The crate ships one engine, [`TransitionSystem`][crate::transition::TransitionSystem],
//! built on the complement-edge BDD manager in [`bdd`].
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_mc::checker::{Session, Verdict};
//! use bdd_mc::formula::Formula;
//! use bdd_mc::transition::{Domain, TransitionSystem};
//! use bdd_mc::config::BddConfig;
//!
//! // x flips at every step, starting from 0.
//! let mut ts = TransitionSystem::with_config(BddConfig::default());
//! ts.declare_state("x", Domain::Range { lo: 0, hi: 1 }).unwrap();
//! let bdd = ts.bdd();
//! let flip = bdd.apply_or(
//!     bdd.apply_and(ts.eq("x", 0).unwrap(), ts.next_eq("x", 1).unwrap()),
//!     bdd.apply_and(ts.eq("x", 1).unwrap(), ts.next_eq("x", 0).unwrap()),
//! );
//! let init = ts.eq("x", 0).unwrap();
//! ts.set_initial(init);
//! ts.set_transition(flip);
//!
//! let session = Session::new(&ts);
//!
//! // x is not always 0...
//! let verdict = session.check_invariant(&Formula::eq("x", 0)).unwrap();
//! assert!(matches!(verdict, Verdict::Violated(ref trace) if trace.len() == 2));
//!
//! // ...but it always comes back to 1.
//! let response = Formula::eq("x", 0).implies(Formula::eq("x", 1).eventually()).globally();
//! assert_eq!(session.check_response(&response).unwrap(), Verdict::Satisfied);
//! ```

pub mod algebra;
pub mod bdd;
pub mod cache;
pub mod checker;
pub mod classify;
pub mod config;
pub mod error;
pub mod fixpoint;
pub mod formula;
pub mod invariant;
pub mod reactivity;
pub mod reference;
pub mod response;
pub mod sat;
pub mod table;
pub mod trace;
pub mod transition;
pub mod utils;
