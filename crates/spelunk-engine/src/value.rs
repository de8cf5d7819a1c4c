//! Symbolic values.
//!
//! A [`SymbolicValue`] is an opaque identity: two values are the same
//! abstract value iff their ids are equal. The first three ids are reserved
//! for the literal singletons; every other id is minted by the constraint
//! manager, which also keeps per-value metadata (origin tree, provenance).

use std::fmt;

/// Identity of one abstract runtime value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolicValue(pub(crate) u32);

impl SymbolicValue {
    /// The `null` literal.
    pub const NULL_LITERAL: SymbolicValue = SymbolicValue(0);
    /// The `true` literal.
    pub const TRUE_LITERAL: SymbolicValue = SymbolicValue(1);
    /// The `false` literal.
    pub const FALSE_LITERAL: SymbolicValue = SymbolicValue(2);

    pub(crate) const LITERAL_COUNT: u32 = 3;

    /// Whether this is one of the three literal singletons.
    pub fn is_literal(self) -> bool {
        self.0 < Self::LITERAL_COUNT
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NULL_LITERAL => write!(f, "SV(null)"),
            Self::TRUE_LITERAL => write!(f, "SV(true)"),
            Self::FALSE_LITERAL => write!(f, "SV(false)"),
            Self(id) => write!(f, "SV#{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_distinct_singletons() {
        assert!(SymbolicValue::NULL_LITERAL.is_literal());
        assert!(SymbolicValue::TRUE_LITERAL.is_literal());
        assert!(SymbolicValue::FALSE_LITERAL.is_literal());
        assert_ne!(SymbolicValue::TRUE_LITERAL, SymbolicValue::FALSE_LITERAL);
        assert_ne!(SymbolicValue::NULL_LITERAL, SymbolicValue::FALSE_LITERAL);
        assert!(!SymbolicValue(3).is_literal());
    }
}
