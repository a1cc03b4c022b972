//! Temporal-logic formula trees.
//!
//! A [`Formula`] is an owned tree over boolean connectives, atomic
//! comparisons and the temporal operators `X`, `G`, `F` and `U`. Its
//! [`Display`](fmt::Display) form is fully parenthesized. Printing is not
//! injective, since an atom may be named `TRUE`, so formulas are compared and
//! hashed structurally.

use std::fmt;

/// Relational operator of an atomic comparison.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Gt => a > b,
            CmpOp::Le => a <= b,
            CmpOp::Ge => a >= b,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }
}

/// Side of a comparison: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Var(String),
    Int(i64),
    Bool(bool),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Var(name.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Bool(true) => write!(f, "TRUE"),
            Operand::Bool(false) => write!(f, "FALSE"),
        }
    }
}

/// Formula abstract syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    /// Boolean state variable.
    Atom(String),
    Compare(CmpOp, Operand, Operand),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Xor(Box<Formula>, Box<Formula>),
    Xnor(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    /// X φ
    Next(Box<Formula>),
    /// G φ
    Globally(Box<Formula>),
    /// F φ
    Eventually(Box<Formula>),
    /// φ U ψ
    Until(Box<Formula>, Box<Formula>),
}

/// Node tag of a [`Formula`], for dispatch without looking at children.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    True,
    False,
    Atom,
    Compare,
    Not,
    And,
    Or,
    Xor,
    Xnor,
    Implies,
    Iff,
    Next,
    Globally,
    Eventually,
    Until,
}

impl NodeKind {
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            NodeKind::Next | NodeKind::Globally | NodeKind::Eventually | NodeKind::Until
        )
    }
}

impl Formula {
    pub fn atom(name: impl Into<String>) -> Self {
        Formula::Atom(name.into())
    }

    pub fn compare(op: CmpOp, lhs: Operand, rhs: Operand) -> Self {
        Formula::Compare(op, lhs, rhs)
    }

    /// `name = value`
    pub fn eq(name: impl Into<String>, value: i64) -> Self {
        Formula::Compare(CmpOp::Eq, Operand::var(name), Operand::Int(value))
    }

    /// `name != value`
    pub fn ne(name: impl Into<String>, value: i64) -> Self {
        Formula::Compare(CmpOp::Ne, Operand::var(name), Operand::Int(value))
    }

    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        Formula::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Formula::Or(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: Self) -> Self {
        Formula::Xor(Box::new(self), Box::new(other))
    }

    pub fn xnor(self, other: Self) -> Self {
        Formula::Xnor(Box::new(self), Box::new(other))
    }

    pub fn implies(self, other: Self) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: Self) -> Self {
        Formula::Iff(Box::new(self), Box::new(other))
    }

    pub fn next(self) -> Self {
        Formula::Next(Box::new(self))
    }

    pub fn globally(self) -> Self {
        Formula::Globally(Box::new(self))
    }

    pub fn eventually(self) -> Self {
        Formula::Eventually(Box::new(self))
    }

    pub fn until(self, other: Self) -> Self {
        Formula::Until(Box::new(self), Box::new(other))
    }

    /// Reactivity term `GF f -> GF g`.
    pub fn gf_implies_gf(f: Self, g: Self) -> Self {
        f.eventually().globally().implies(g.eventually().globally())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Formula::True => NodeKind::True,
            Formula::False => NodeKind::False,
            Formula::Atom(_) => NodeKind::Atom,
            Formula::Compare(..) => NodeKind::Compare,
            Formula::Not(_) => NodeKind::Not,
            Formula::And(..) => NodeKind::And,
            Formula::Or(..) => NodeKind::Or,
            Formula::Xor(..) => NodeKind::Xor,
            Formula::Xnor(..) => NodeKind::Xnor,
            Formula::Implies(..) => NodeKind::Implies,
            Formula::Iff(..) => NodeKind::Iff,
            Formula::Next(_) => NodeKind::Next,
            Formula::Globally(_) => NodeKind::Globally,
            Formula::Eventually(_) => NodeKind::Eventually,
            Formula::Until(..) => NodeKind::Until,
        }
    }

    /// The single child of a unary node.
    pub fn child(&self) -> Option<&Formula> {
        match self {
            Formula::Not(a)
            | Formula::Next(a)
            | Formula::Globally(a)
            | Formula::Eventually(a) => Some(a),
            _ => None,
        }
    }

    /// Both children of a binary node.
    pub fn operands(&self) -> Option<(&Formula, &Formula)> {
        match self {
            Formula::And(a, b)
            | Formula::Or(a, b)
            | Formula::Xor(a, b)
            | Formula::Xnor(a, b)
            | Formula::Implies(a, b)
            | Formula::Iff(a, b)
            | Formula::Until(a, b) => Some((a, b)),
            _ => None,
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "TRUE"),
            Formula::False => write!(f, "FALSE"),
            Formula::Atom(name) => write!(f, "{}", name),
            Formula::Compare(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Formula::Not(a) => write!(f, "!{}", a),
            Formula::And(a, b) => write!(f, "({} & {})", a, b),
            Formula::Or(a, b) => write!(f, "({} | {})", a, b),
            Formula::Xor(a, b) => write!(f, "({} xor {})", a, b),
            Formula::Xnor(a, b) => write!(f, "({} xnor {})", a, b),
            Formula::Implies(a, b) => write!(f, "({} -> {})", a, b),
            Formula::Iff(a, b) => write!(f, "({} <-> {})", a, b),
            Formula::Next(a) => write!(f, "X {}", a),
            Formula::Globally(a) => write!(f, "G {}", a),
            Formula::Eventually(a) => write!(f, "F {}", a),
            Formula::Until(a, b) => write!(f, "({} U {})", a, b),
        }
    }
}

impl Formula {
    /// Moves the non-leaf children of this node out to `stack`.
    fn detach_children(&mut self, stack: &mut Vec<Box<Formula>>) {
        let mut take = |child: &mut Box<Formula>| {
            if child.child().is_some() || child.operands().is_some() {
                stack.push(std::mem::replace(child, Box::new(Formula::True)));
            }
        };
        match self {
            Formula::Not(a)
            | Formula::Next(a)
            | Formula::Globally(a)
            | Formula::Eventually(a) => take(a),
            Formula::And(a, b)
            | Formula::Or(a, b)
            | Formula::Xor(a, b)
            | Formula::Xnor(a, b)
            | Formula::Implies(a, b)
            | Formula::Iff(a, b)
            | Formula::Until(a, b) => {
                take(a);
                take(b);
            }
            Formula::True | Formula::False | Formula::Atom(_) | Formula::Compare(..) => {}
        }
    }
}

// Conjunctions of any depth are accepted, so the tree is torn down with an
// explicit stack instead of recursion.
impl Drop for Formula {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut node) = stack.pop() {
            node.detach_children(&mut stack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_parenthesized() {
        let f = Formula::eq("x", 0)
            .implies(Formula::eq("x", 1).eventually())
            .globally();
        assert_eq!(f.to_string(), "G ((x = 0) -> F (x = 1))");

        let g = Formula::gf_implies_gf(Formula::atom("p"), Formula::atom("q").not());
        assert_eq!(g.to_string(), "(G F p -> G F !q)");

        let h = Formula::compare(CmpOp::Le, Operand::var("a"), Operand::var("b"))
            .xor(Formula::True);
        assert_eq!(h.to_string(), "((a <= b) xor TRUE)");
    }

    #[test]
    fn test_kind_and_accessors() {
        let f = Formula::atom("p").and(Formula::atom("q"));
        assert_eq!(f.kind(), NodeKind::And);
        assert!(f.child().is_none());
        let (a, b) = f.operands().unwrap();
        assert_eq!(a, &Formula::atom("p"));
        assert_eq!(b, &Formula::atom("q"));

        let g = Formula::atom("p").globally();
        assert!(g.kind().is_temporal());
        assert_eq!(g.child(), Some(&Formula::atom("p")));
        assert!(g.operands().is_none());
    }

    #[test]
    fn test_deep_tree_drops() {
        let mut formula = Formula::atom("p0");
        for i in 1..=200_000 {
            formula = Formula::atom(format!("p{}", i)).and(formula);
        }
        let mut unary = Formula::True;
        for _ in 0..200_000 {
            unary = unary.not().next();
        }
        drop(formula);
        drop(unary);

        // Children are detached only when the tree is dropped.
        let f = Formula::atom("p").and(Formula::atom("q").not());
        let g = f.clone();
        drop(f);
        assert_eq!(g.to_string(), "(p & !q)");
    }

    #[test]
    fn test_cmp_op() {
        assert!(CmpOp::Le.holds(2, 2));
        assert!(!CmpOp::Lt.holds(2, 2));
        assert!(CmpOp::Ne.holds(1, 2));
        assert!(CmpOp::Ge.holds(3, 2));
    }
}
