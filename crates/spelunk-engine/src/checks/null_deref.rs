//! Detects dereferences of values the current state proves null.
//!
//! A dereference is a member select (other than the `class` pseudo-field) or
//! a method invocation through an expression receiver. At the pre-statement
//! hook the receiver has been evaluated but not yet consumed, so it is found
//! on the operand stack: on top for a member select, `argc` below the top
//! for an invocation.
//!
//! If the state already implies the receiver is null, the dereference is
//! reported and the path is sunk. Otherwise exploration proceeds with the
//! receiver constrained non-null: the null possibility has been split off
//! and every later dereference of the same value is silent.

use spelunk_lang::{MethodTarget, TreeId, TreeKind};

use super::{Check, CheckContext, Verdict};
use crate::constraint::{Constraint, Nullness};
use crate::value::SymbolicValue;

const CHECK: &str = "null-dereference";

#[derive(Default)]
pub struct NullDereference;

impl NullDereference {
    pub fn new() -> Self {
        Self
    }

    fn receiver_name(ctx: &CheckContext<'_>, receiver: SymbolicValue) -> Option<String> {
        let origin = ctx.manager.origin(receiver)?;
        match ctx.procedure.trees.kind(origin) {
            TreeKind::Identifier { symbol } | TreeKind::VariableDeclaration { symbol, .. } => {
                Some(ctx.procedure.symbols.name(*symbol).to_string())
            }
            _ => None,
        }
    }
}

impl Check for NullDereference {
    fn name(&self) -> &'static str {
        CHECK
    }

    fn pre_statement(&mut self, tree: TreeId, ctx: &mut CheckContext<'_>) -> Verdict {
        let receiver = match ctx.procedure.trees.kind(tree) {
            TreeKind::MemberSelect { member } if member != "class" => ctx.state.peek(),
            TreeKind::MethodInvocation {
                argument_count,
                target: MethodTarget::Expression,
            } => ctx.state.peek_at(*argument_count),
            _ => return Verdict::Continue,
        };
        let Some(receiver) = receiver else {
            return Verdict::Continue;
        };

        let not_null = ctx
            .manager
            .set_constraint(receiver, &ctx.state, Constraint::Nullness(Nullness::NotNull));
        if not_null.is_empty() {
            // The state proves the receiver null.
            let message = match Self::receiver_name(ctx, receiver) {
                Some(name) => {
                    format!("NullPointerException might be thrown as '{name}' is nullable here")
                }
                None => "NullPointerException might be thrown as this expression is nullable here"
                    .to_string(),
            };
            ctx.report_issue(tree, CHECK, message);
            return Verdict::Sink;
        }
        if let Some(state) = not_null.into_iter().next() {
            ctx.state = state;
        }
        Verdict::Continue
    }
}
