//! Program states.
//!
//! A [`ProgramState`] is an immutable snapshot of one path's knowledge:
//! variable bindings, per-value constraints, the operand stack, and how
//! often each program point was entered along the path. States are:
//!
//! - Immutable: every update returns a new state sharing structure with the
//!   old one (persistent maps underneath).
//! - Hashable: node interning looks a state up on every enqueue, so the
//!   fingerprint is computed once at construction and cached.
//! - Deterministically ordered: the map fields iterate in key order, which
//!   keeps fingerprints and downstream iteration stable across runs.
//!
//! # Fingerprinting
//!
//! States hash by a 64-bit FNV-1a fingerprint over all four fields (each
//! section tagged, lengths mixed in). Equality stays structural; the
//! fingerprint is only a fast path.

use std::fmt;
use std::hash::{Hash, Hasher};

use im::{OrdMap, Vector};
use spelunk_lang::{BlockId, SymbolId};

use crate::constraint::SvConstraints;
use crate::error::{EngineError, Result};
use crate::value::SymbolicValue;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// A location in the CFG: a block and an element index. `index` equal to
/// the element count addresses the block's terminator/exit position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProgramPoint {
    pub block: BlockId,
    pub index: usize,
}

impl ProgramPoint {
    pub fn new(block: BlockId, index: usize) -> Self {
        ProgramPoint { block, index }
    }

    pub fn next(self) -> Self {
        ProgramPoint {
            block: self.block,
            index: self.index + 1,
        }
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}.{}", self.block.0, self.index)
    }
}

/// Immutable snapshot of one explored path.
#[derive(Clone)]
pub struct ProgramState {
    values: OrdMap<SymbolId, SymbolicValue>,
    constraints: OrdMap<SymbolicValue, SvConstraints>,
    visited: OrdMap<ProgramPoint, u32>,
    stack: Vector<SymbolicValue>,
    fingerprint: u64,
}

impl ProgramState {
    /// The state with no bindings, no constraints, and an empty stack.
    pub fn empty() -> Self {
        Self::build(OrdMap::new(), OrdMap::new(), OrdMap::new(), Vector::new())
    }

    fn build(
        values: OrdMap<SymbolId, SymbolicValue>,
        constraints: OrdMap<SymbolicValue, SvConstraints>,
        visited: OrdMap<ProgramPoint, u32>,
        stack: Vector<SymbolicValue>,
    ) -> Self {
        let fingerprint = compute_fingerprint(&values, &constraints, &visited, &stack);
        ProgramState {
            values,
            constraints,
            visited,
            stack,
            fingerprint,
        }
    }

    /// Bind `symbol` to `value`.
    pub fn put(&self, symbol: SymbolId, value: SymbolicValue) -> Self {
        let mut values = self.values.clone();
        values.insert(symbol, value);
        Self::build(
            values,
            self.constraints.clone(),
            self.visited.clone(),
            self.stack.clone(),
        )
    }

    /// The value bound to `symbol`, if any.
    pub fn value_of(&self, symbol: SymbolId) -> Option<SymbolicValue> {
        self.values.get(&symbol).copied()
    }

    /// Iterate bindings in symbol order.
    pub fn values(&self) -> impl Iterator<Item = (SymbolId, SymbolicValue)> + '_ {
        self.values.iter().map(|(s, v)| (*s, *v))
    }

    pub fn bindings_len(&self) -> usize {
        self.values.len()
    }

    /// Push a value onto the operand stack.
    pub fn stack_value(&self, value: SymbolicValue) -> Self {
        let mut stack = self.stack.clone();
        stack.push_back(value);
        Self::build(
            self.values.clone(),
            self.constraints.clone(),
            self.visited.clone(),
            stack,
        )
    }

    /// Pop `n` values. The popped values are returned deepest first. Popping
    /// more than the stack holds is an internal error.
    pub fn unstack(&self, n: usize) -> Result<(Self, Vec<SymbolicValue>)> {
        let len = self.stack.len();
        if n > len {
            return Err(EngineError::internal(format!(
                "operand stack underflow: popping {n} of {len}"
            )));
        }
        let mut stack = self.stack.clone();
        let popped = stack.split_off(len - n);
        let state = Self::build(
            self.values.clone(),
            self.constraints.clone(),
            self.visited.clone(),
            stack,
        );
        Ok((state, popped.into_iter().collect()))
    }

    /// The value on top of the stack, if any.
    pub fn peek(&self) -> Option<SymbolicValue> {
        self.stack.last().copied()
    }

    /// The value `depth` entries below the top (`peek_at(0)` is the top).
    pub fn peek_at(&self, depth: usize) -> Option<SymbolicValue> {
        let len = self.stack.len();
        if depth < len {
            self.stack.get(len - 1 - depth).copied()
        } else {
            None
        }
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Discard the entire operand stack.
    pub fn clear_stack(&self) -> Self {
        if self.stack.is_empty() {
            return self.clone();
        }
        Self::build(
            self.values.clone(),
            self.constraints.clone(),
            self.visited.clone(),
            Vector::new(),
        )
    }

    /// The constraints `value` holds in this state. Empty for values never
    /// constrained here.
    pub fn constraints_of(&self, value: SymbolicValue) -> SvConstraints {
        self.constraints.get(&value).copied().unwrap_or_default()
    }

    /// Replace the constraint record of `value`.
    pub fn with_constraints(&self, value: SymbolicValue, constraints: SvConstraints) -> Self {
        let mut map = self.constraints.clone();
        map.insert(value, constraints);
        Self::build(
            self.values.clone(),
            map,
            self.visited.clone(),
            self.stack.clone(),
        )
    }

    /// Number of values with at least one recorded constraint.
    pub fn constraints_len(&self) -> usize {
        self.constraints.len()
    }

    /// How many times `point` was entered along the path producing this
    /// state.
    pub fn times_visited(&self, point: ProgramPoint) -> u32 {
        self.visited.get(&point).copied().unwrap_or(0)
    }

    /// Record that `point` has now been entered `count` times.
    pub fn with_visited(&self, point: ProgramPoint, count: u32) -> Self {
        let mut visited = self.visited.clone();
        visited.insert(point, count);
        Self::build(
            self.values.clone(),
            self.constraints.clone(),
            visited,
            self.stack.clone(),
        )
    }

    /// Iterate visit counters in point order.
    pub fn visited(&self) -> impl Iterator<Item = (ProgramPoint, u32)> + '_ {
        self.visited.iter().map(|(p, c)| (*p, *c))
    }

    /// Replace all variable bindings at once, keeping everything else. Used
    /// by the field reset.
    pub fn with_values(&self, values: OrdMap<SymbolId, SymbolicValue>) -> Self {
        Self::build(
            values,
            self.constraints.clone(),
            self.visited.clone(),
            self.stack.clone(),
        )
    }

    /// Snapshot of the bindings map, for bulk edits.
    pub fn values_map(&self) -> OrdMap<SymbolId, SymbolicValue> {
        self.values.clone()
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl PartialEq for ProgramState {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
            && self.values == other.values
            && self.constraints == other.constraints
            && self.visited == other.visited
            && self.stack == other.stack
    }
}

impl Eq for ProgramState {}

impl Hash for ProgramState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Debug for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramState")
            .field("values", &self.values)
            .field("constraints", &self.constraints)
            .field("visited", &self.visited)
            .field("stack", &self.stack)
            .finish()
    }
}

#[inline]
fn mix(mut hash: u64, byte: u64) -> u64 {
    hash ^= byte;
    hash.wrapping_mul(FNV_PRIME)
}

#[inline]
fn mix_u32(hash: u64, value: u32) -> u64 {
    mix(hash, value as u64)
}

fn compute_fingerprint(
    values: &OrdMap<SymbolId, SymbolicValue>,
    constraints: &OrdMap<SymbolicValue, SvConstraints>,
    visited: &OrdMap<ProgramPoint, u32>,
    stack: &Vector<SymbolicValue>,
) -> u64 {
    let mut hash = FNV_OFFSET;

    hash = mix(hash, 1);
    hash = mix(hash, values.len() as u64);
    for (symbol, value) in values {
        hash = mix_u32(hash, symbol.0);
        hash = mix_u32(hash, value.0);
    }

    hash = mix(hash, 2);
    hash = mix(hash, constraints.len() as u64);
    for (value, known) in constraints {
        hash = mix_u32(hash, value.0);
        hash = mix(hash, constraint_tag(known));
    }

    hash = mix(hash, 3);
    hash = mix(hash, visited.len() as u64);
    for (point, count) in visited {
        hash = mix_u32(hash, point.block.0);
        hash = mix(hash, point.index as u64);
        hash = mix_u32(hash, *count);
    }

    hash = mix(hash, 4);
    hash = mix(hash, stack.len() as u64);
    for value in stack {
        hash = mix_u32(hash, value.0);
    }

    // Final mixing to improve distribution.
    hash = hash.wrapping_mul(FNV_PRIME);
    hash ^= hash >> 33;
    hash.wrapping_mul(FNV_PRIME)
}

fn constraint_tag(known: &SvConstraints) -> u64 {
    use crate::constraint::{Nullness, Truthiness};
    let nullness = match known.nullness {
        None => 0u64,
        Some(Nullness::Null) => 1,
        Some(Nullness::NotNull) => 2,
    };
    let truthiness = match known.truthiness {
        None => 0u64,
        Some(Truthiness::True) => 1,
        Some(Truthiness::False) => 2,
    };
    nullness * 3 + truthiness
}
