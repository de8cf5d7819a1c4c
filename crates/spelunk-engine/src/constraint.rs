//! Constraints and the constraint manager.
//!
//! The manager is the only factory for symbolic values and the only place
//! that learns constraints. Two constraint kinds coexist: nullness
//! (`Null`/`NotNull`) and truthiness (`True`/`False`). Within one program
//! state a value holds at most one constraint per kind; imposing the
//! opposite value of an existing constraint makes the state infeasible.
//! The kinds are independent except for one pair: a null value is
//! false-like, so `Null` and `True` exclude each other.
//!
//! Constraint-imposing operations return *lists* of refined states rather
//! than booleans: an empty list means the combination is infeasible, and the
//! list shape leaves room for kinds that refine a state into more than two
//! successors.
//!
//! The literal singletons never appear in the constraint store; their
//! constraints are intrinsic (`true` is true-valued and non-null, `false`
//! is false-valued and non-null, `null` is null and false-like) and are
//! consulted on the fly.

use smallvec::SmallVec;
use spelunk_lang::{LiteralValue, TreeId};

use crate::error::{EngineError, Result};
use crate::state::ProgramState;
use crate::value::SymbolicValue;

/// Nullness of a reference value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Nullness {
    Null,
    NotNull,
}

/// Truth value of a boolean result.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Truthiness {
    True,
    False,
}

/// One constraint, tagged with its kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Constraint {
    Nullness(Nullness),
    Truthiness(Truthiness),
}

/// The constraints a single value holds within one state: at most one value
/// per kind.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SvConstraints {
    pub nullness: Option<Nullness>,
    pub truthiness: Option<Truthiness>,
}

impl SvConstraints {
    pub fn is_empty(&self) -> bool {
        self.nullness.is_none() && self.truthiness.is_none()
    }

    fn with(mut self, constraint: Constraint) -> Self {
        match constraint {
            Constraint::Nullness(n) => self.nullness = Some(n),
            Constraint::Truthiness(t) => self.truthiness = Some(t),
        }
        self
    }
}

/// How a prospective constraint relates to what a state already knows.
enum Standing {
    Implied,
    Contradicted,
    Open,
}

struct SvData {
    origin: Option<TreeId>,
    computed_from: SmallVec<[SymbolicValue; 2]>,
}

/// Factory for symbolic values and the single entry point for learning
/// constraints.
pub struct ConstraintManager {
    values: Vec<SvData>,
}

impl Default for ConstraintManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintManager {
    pub fn new() -> Self {
        let mut values = Vec::new();
        for _ in 0..SymbolicValue::LITERAL_COUNT {
            values.push(SvData {
                origin: None,
                computed_from: SmallVec::new(),
            });
        }
        ConstraintManager { values }
    }

    /// Mint a fresh value with no constraints. The origin is recorded for
    /// diagnostics only.
    pub fn new_value(&mut self, origin: impl Into<Option<TreeId>>) -> SymbolicValue {
        let id = SymbolicValue(self.values.len() as u32);
        self.values.push(SvData {
            origin: origin.into(),
            computed_from: SmallVec::new(),
        });
        id
    }

    /// Mint a fresh value intended to replace an existing binding: some
    /// unknown value about which nothing is assumed.
    pub fn supersede_value(&mut self, origin: impl Into<Option<TreeId>>) -> SymbolicValue {
        self.new_value(origin)
    }

    /// Evaluate a literal: the singletons for null and booleans, a fresh
    /// value for everything else.
    pub fn eval_literal(&mut self, value: LiteralValue, origin: TreeId) -> SymbolicValue {
        match value {
            LiteralValue::Null => SymbolicValue::NULL_LITERAL,
            LiteralValue::Boolean(true) => SymbolicValue::TRUE_LITERAL,
            LiteralValue::Boolean(false) => SymbolicValue::FALSE_LITERAL,
            _ => self.new_value(origin),
        }
    }

    /// Record the ordered operands a value was computed from. Provenance has
    /// no effect on the constraint store; checkers use it to trace a boolean
    /// result back to its inputs.
    pub fn record_computed_from(
        &mut self,
        value: SymbolicValue,
        operands: impl IntoIterator<Item = SymbolicValue>,
    ) {
        let data = &mut self.values[value.index()];
        data.computed_from.clear();
        data.computed_from.extend(operands);
    }

    /// The operands a value was computed from, deepest first. Empty for
    /// values with no recorded provenance.
    pub fn computed_from(&self, value: SymbolicValue) -> &[SymbolicValue] {
        &self.values[value.index()].computed_from
    }

    /// The syntax node that produced a value, if any.
    pub fn origin(&self, value: SymbolicValue) -> Option<TreeId> {
        self.values[value.index()].origin
    }

    /// Number of values minted so far, literals included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The successor states consistent with `value` holding `constraint`.
    ///
    /// Empty if the state already implies the opposite; the unchanged state
    /// if it already implies the constraint; otherwise the state with the
    /// constraint added.
    pub fn set_constraint(
        &self,
        value: SymbolicValue,
        state: &ProgramState,
        constraint: Constraint,
    ) -> Vec<ProgramState> {
        match self.standing(value, state, constraint) {
            Standing::Contradicted => Vec::new(),
            Standing::Implied => vec![state.clone()],
            Standing::Open => {
                let known = state.constraints_of(value);
                vec![state.with_constraints(value, known.with(constraint))]
            }
        }
    }

    /// Like [`set_constraint`](Self::set_constraint), asserting that exactly
    /// one successor exists.
    pub fn set_single_constraint(
        &self,
        value: SymbolicValue,
        state: &ProgramState,
        constraint: Constraint,
    ) -> Result<ProgramState> {
        let mut states = self.set_constraint(value, state, constraint);
        match (states.pop(), states.is_empty()) {
            (Some(state), true) => Ok(state),
            _ => Err(EngineError::internal(format!(
                "expected exactly one successor when constraining {value:?} with {constraint:?}"
            ))),
        }
    }

    /// Split a state on the value at the top of its operand stack: the
    /// states consistent with it being false-like (boolean false or null)
    /// and those consistent with it being true-like. Either side may be
    /// empty. The top of the stack is left in place.
    pub fn assume_dual(
        &self,
        state: &ProgramState,
    ) -> Result<(Vec<ProgramState>, Vec<ProgramState>)> {
        let value = state
            .peek()
            .ok_or_else(|| EngineError::internal("dual assume on an empty operand stack"))?;
        let false_states =
            self.set_constraint(value, state, Constraint::Truthiness(Truthiness::False));
        let true_states =
            self.set_constraint(value, state, Constraint::Truthiness(Truthiness::True));
        Ok((false_states, true_states))
    }

    fn standing(
        &self,
        value: SymbolicValue,
        state: &ProgramState,
        constraint: Constraint,
    ) -> Standing {
        let known = if value.is_literal() {
            Self::intrinsic(value)
        } else {
            state.constraints_of(value)
        };
        // A null value cannot be true-valued: the kinds exclude each other
        // on this one pair.
        match constraint {
            Constraint::Truthiness(Truthiness::True)
                if known.nullness == Some(Nullness::Null) =>
            {
                return Standing::Contradicted;
            }
            Constraint::Nullness(Nullness::Null)
                if known.truthiness == Some(Truthiness::True) =>
            {
                return Standing::Contradicted;
            }
            _ => {}
        }
        let existing = match constraint {
            Constraint::Nullness(_) => known.nullness.map(Constraint::Nullness),
            Constraint::Truthiness(_) => known.truthiness.map(Constraint::Truthiness),
        };
        match existing {
            None => Standing::Open,
            Some(c) if c == constraint => Standing::Implied,
            Some(_) => Standing::Contradicted,
        }
    }

    fn intrinsic(value: SymbolicValue) -> SvConstraints {
        match value {
            SymbolicValue::NULL_LITERAL => SvConstraints {
                nullness: Some(Nullness::Null),
                truthiness: Some(Truthiness::False),
            },
            SymbolicValue::TRUE_LITERAL => SvConstraints {
                nullness: Some(Nullness::NotNull),
                truthiness: Some(Truthiness::True),
            },
            SymbolicValue::FALSE_LITERAL => SvConstraints {
                nullness: Some(Nullness::NotNull),
                truthiness: Some(Truthiness::False),
            },
            _ => unreachable!("intrinsic constraints exist only for literals"),
        }
    }
}
