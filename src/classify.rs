//! Shape recognition for the supported property classes.
//!
//! None of these functions fail: a formula of the wrong shape is simply
//! reported as not matching.

use crate::formula::{Formula, NodeKind};

/// True iff `formula` contains no temporal operator.
pub fn is_propositional(formula: &Formula) -> bool {
    match formula.kind() {
        NodeKind::True | NodeKind::False | NodeKind::Atom | NodeKind::Compare => true,
        NodeKind::Not => formula.child().is_some_and(is_propositional),
        NodeKind::And
        | NodeKind::Or
        | NodeKind::Xor
        | NodeKind::Xnor
        | NodeKind::Implies
        | NodeKind::Iff => formula
            .operands()
            .is_some_and(|(a, b)| is_propositional(a) && is_propositional(b)),
        NodeKind::Next | NodeKind::Globally | NodeKind::Eventually | NodeKind::Until => false,
    }
}

/// Matches `G (f -> F g)` with propositional `f` and `g`.
pub fn match_response(formula: &Formula) -> Option<(&Formula, &Formula)> {
    if formula.kind() != NodeKind::Globally {
        return None;
    }
    let body = formula.child()?;
    if body.kind() != NodeKind::Implies {
        return None;
    }
    let (f, eventually) = body.operands()?;
    if eventually.kind() != NodeKind::Eventually {
        return None;
    }
    let g = eventually.child()?;
    (is_propositional(f) && is_propositional(g)).then_some((f, g))
}

/// Strips a `G F` prefix.
fn globally_eventually(formula: &Formula) -> Option<&Formula> {
    if formula.kind() != NodeKind::Globally {
        return None;
    }
    let inner = formula.child()?;
    if inner.kind() != NodeKind::Eventually {
        return None;
    }
    inner.child()
}

/// Matches a single `GF f -> GF g` term with propositional `f` and `g`.
pub fn match_reactivity_term(formula: &Formula) -> Option<(&Formula, &Formula)> {
    if formula.kind() != NodeKind::Implies {
        return None;
    }
    let (lhs, rhs) = formula.operands()?;
    let f = globally_eventually(lhs)?;
    let g = globally_eventually(rhs)?;
    (is_propositional(f) && is_propositional(g)).then_some((f, g))
}

/// Matches a conjunction of `GF f_i -> GF g_i` terms, nested in any shape.
///
/// Terms come back in left-to-right order. A single conjunct of any other
/// shape rejects the whole formula.
pub fn match_reactivity(formula: &Formula) -> Option<Vec<(&Formula, &Formula)>> {
    let mut terms = Vec::new();
    let mut stack = vec![formula];
    while let Some(node) = stack.pop() {
        if node.kind() == NodeKind::And {
            let (left, right) = node.operands()?;
            stack.push(right);
            stack.push(left);
        } else {
            terms.push(match_reactivity_term(node)?);
        }
    }
    Some(terms)
}
