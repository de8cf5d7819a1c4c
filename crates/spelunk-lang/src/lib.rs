//! Procedure representation consumed by the spelunk engine.
//!
//! This crate is the boundary between the engine and whatever front end
//! produced the code under analysis. It deliberately contains no parser:
//! a front end (or a test) assembles three pieces by hand and hands them to
//! the engine as a [`Procedure`]:
//!
//! - a [`TreeArena`] of syntax nodes, carrying exactly the information the
//!   engine's transfer function dispatches on (kind, parent link, line);
//! - a [`SymbolTable`] resolving identifiers to symbols with their kind,
//!   owner, declared type and annotations;
//! - a [`Cfg`] of basic blocks over those trees, assembled through the
//!   validating [`CfgBuilder`].
//!
//! Block elements appear in evaluation order; conditional blocks expose
//! their true/false successors explicitly. Successor ordering is stable,
//! which the engine relies on for deterministic exploration.

pub mod cfg;
pub mod symbol;
pub mod tree;

pub use cfg::{Block, BlockId, Cfg, CfgBuilder, CfgError, Procedure};
pub use symbol::{SymbolId, SymbolKind, SymbolTable, TypeKind};
pub use tree::{
    AssignmentTarget, BinaryOp, LiteralValue, MethodTarget, TreeArena, TreeId, TreeKind, UnaryOp,
};
