use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Handle to a BDD node, possibly through a complemented edge.
///
/// The magnitude is the node index in the manager's table, the sign carries
/// the complement bit. Index `1` is the terminal, so `+1` is `true` and `-1`
/// is `false`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ref(i32);

impl Ref {
    /// Sentinel for "not set yet", never produced by the manager.
    pub const INVALID: Ref = Ref(0);

    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Strip the complement bit.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    /// Raw signed representation.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Index of the referenced node.
    pub const fn index(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Injective mapping into `u64`, used for hashing.
    pub(crate) const fn as_lit(self) -> u64 {
        ((self.0.unsigned_abs() as u64) << 1) | (self.0 < 0) as u64
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.index())
    }
}
