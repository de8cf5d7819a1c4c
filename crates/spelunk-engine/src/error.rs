//! Engine errors.
//!
//! Two failure families exist. The bounded aborts (`MaximumStepsReached`,
//! `ExplodedGraphTooBig`) are expected on pathological inputs: the driver
//! catches them, drops the procedure, and moves on. `Internal` signals a
//! violated invariant (unexpected tree kind in a block, operand stack
//! underflow) and should be treated as a crash for the procedure.
//!
//! Infeasible paths are not errors: they surface as empty result lists from
//! the constraint manager and the walker simply does not enqueue them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The per-procedure step budget was exhausted.
    #[error("reached the limit of {limit} steps while exploring `{method}`")]
    MaximumStepsReached { method: String, limit: usize },

    /// The frontier and the constraint store both grew past their gates.
    #[error(
        "program state constraints grew too large while exploring `{method}` \
         ({constraints} constrained values)"
    )]
    ExplodedGraphTooBig { method: String, constraints: usize },

    /// A broken invariant; a bug, not an input problem.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
