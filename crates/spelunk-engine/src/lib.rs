//! Symbolic execution engine.
//!
//! This crate explores the feasible paths of a single procedure at a time,
//! computing a set of symbolic program states at every program point. On top
//! of the engine, pluggable checkers observe state transitions and report
//! defects such as possible null dereferences or conditions that evaluate
//! the same way on every feasible path.
//!
//! # Pieces
//!
//! - [`SymbolicValue`] / [`ConstraintManager`]: opaque value identities, the
//!   nullness and truthiness constraint store, and the dual-assume split
//!   that is the engine's only source of learned constraints.
//! - [`ProgramState`]: immutable snapshot of bindings, constraints, operand
//!   stack and visit counters, with structure sharing and a cached
//!   fingerprint for interning.
//! - [`ExplodedGraph`]: the interning table of `(program point, state)`
//!   nodes that keeps exploration finite on converging paths.
//! - [`Walker`]: the depth-first worklist loop, per-statement transfer
//!   functions, branch splitting, and the hard limits.
//! - [`checks`]: the checker capability interface, dispatcher, and the two
//!   built-in checkers.
//!
//! # Example
//!
//! ```
//! use spelunk_engine::{Issue, Walker};
//! use spelunk_lang::{Procedure, SymbolTable, TreeArena};
//!
//! // A procedure without a body: nothing to explore.
//! let procedure = Procedure {
//!     name: "empty".to_string(),
//!     line: 1,
//!     parameters: Vec::new(),
//!     trees: TreeArena::new(),
//!     symbols: SymbolTable::new(),
//!     body: None,
//! };
//!
//! let mut issues: Vec<Issue> = Vec::new();
//! let summary = Walker::new(&mut issues).visit_method(&procedure).unwrap();
//! assert_eq!(summary.steps, 0);
//! assert!(issues.is_empty());
//! ```
//!
//! The engine is single-threaded and deterministic: the same procedure, the
//! same checker registration order and the same configuration produce the
//! same node sequence, the same diagnostics and the same outcome on every
//! run.

pub mod checks;
mod config;
mod constraint;
mod error;
mod graph;
mod report;
mod state;
mod value;
mod walker;

pub use config::WalkerConfig;
pub use constraint::{Constraint, ConstraintManager, Nullness, SvConstraints, Truthiness};
pub use error::{EngineError, Result};
pub use graph::{ExplodedGraph, Node};
pub use report::{DiagnosticSink, Issue};
pub use state::{ProgramPoint, ProgramState};
pub use value::SymbolicValue;
pub use walker::{ExecutionSummary, Walker};
