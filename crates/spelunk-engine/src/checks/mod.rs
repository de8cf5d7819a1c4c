//! Checker dispatch.
//!
//! Checkers observe the walker's transitions through a small capability
//! interface and may veto further exploration of a node (a *sink*). The
//! dispatcher runs them in registration order and short-circuits on the
//! first sink.
//!
//! Hooks receive an explicit [`CheckContext`] — the current program state
//! (replaceable), the constraint manager, the procedure, and the issue
//! buffer — rather than a handle to the walker itself, so no reference
//! cycle exists between dispatcher and walker.

mod condition;
mod null_deref;

pub use condition::ConditionAlwaysTrueOrFalse;
pub use null_deref::NullDereference;

use spelunk_lang::{Procedure, TreeId};

use crate::constraint::ConstraintManager;
use crate::report::Issue;
use crate::state::ProgramState;

/// Outcome of a pre-statement hook.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Continue,
    /// Halt exploration at this node; no successors are enqueued.
    Sink,
}

/// What a checker sees at a pre/post-statement hook.
pub struct CheckContext<'a> {
    /// The state the transition runs under. A checker may replace it; the
    /// walker continues with whatever is left here.
    pub state: ProgramState,
    pub manager: &'a mut ConstraintManager,
    pub procedure: &'a Procedure,
    issues: &'a mut Vec<Issue>,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(
        state: ProgramState,
        manager: &'a mut ConstraintManager,
        procedure: &'a Procedure,
        issues: &'a mut Vec<Issue>,
    ) -> Self {
        CheckContext {
            state,
            manager,
            procedure,
            issues,
        }
    }

    /// Report a defect at `tree`. Identical reports (same tree, check and
    /// message) from different paths collapse into one.
    pub fn report_issue(&mut self, tree: TreeId, check: &'static str, message: impl Into<String>) {
        push_issue(self.issues, self.procedure, tree, check, message.into());
    }
}

/// Context of the end-of-execution hook; there is no current state anymore,
/// only the procedure and the issue buffer.
pub struct EndContext<'a> {
    pub procedure: &'a Procedure,
    issues: &'a mut Vec<Issue>,
}

impl<'a> EndContext<'a> {
    pub(crate) fn new(procedure: &'a Procedure, issues: &'a mut Vec<Issue>) -> Self {
        EndContext { procedure, issues }
    }

    pub fn report_issue(&mut self, tree: TreeId, check: &'static str, message: impl Into<String>) {
        push_issue(self.issues, self.procedure, tree, check, message.into());
    }
}

fn push_issue(
    issues: &mut Vec<Issue>,
    procedure: &Procedure,
    tree: TreeId,
    check: &'static str,
    message: String,
) {
    let issue = Issue {
        tree,
        line: procedure.trees.line(tree),
        check,
        message,
    };
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}

/// A checker. All hooks default to doing nothing, so a checker implements
/// only what it observes.
pub trait Check {
    /// Stable identifier used in reported issues.
    fn name(&self) -> &'static str;

    /// Reset per-procedure accumulators. Called once before exploration.
    fn init(&mut self) {}

    /// Runs before a statement's transfer. Returning [`Verdict::Sink`]
    /// halts exploration of the current node.
    fn pre_statement(&mut self, _tree: TreeId, _ctx: &mut CheckContext<'_>) -> Verdict {
        Verdict::Continue
    }

    /// Runs after a statement's transfer. No veto.
    fn post_statement(&mut self, _tree: TreeId, _ctx: &mut CheckContext<'_>) {}

    /// A branch condition was found feasible with the given outcome.
    fn condition_evaluated(&mut self, _condition: TreeId, _outcome: bool) {}

    /// Exploration of the procedure finished.
    fn end_of_execution(&mut self, _ctx: &mut EndContext<'_>) {}
}

/// Ordered list of checkers.
pub struct CheckerDispatcher {
    checks: Vec<Box<dyn Check>>,
}

impl CheckerDispatcher {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        CheckerDispatcher { checks }
    }

    pub fn push(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn init(&mut self) {
        for check in &mut self.checks {
            check.init();
        }
    }

    /// Run all pre-statement hooks in order; the first sink wins.
    pub fn pre_statement(&mut self, tree: TreeId, ctx: &mut CheckContext<'_>) -> Verdict {
        for check in &mut self.checks {
            if check.pre_statement(tree, ctx) == Verdict::Sink {
                return Verdict::Sink;
            }
        }
        Verdict::Continue
    }

    pub fn post_statement(&mut self, tree: TreeId, ctx: &mut CheckContext<'_>) {
        for check in &mut self.checks {
            check.post_statement(tree, ctx);
        }
    }

    pub fn condition_evaluated(&mut self, condition: TreeId, outcome: bool) {
        for check in &mut self.checks {
            check.condition_evaluated(condition, outcome);
        }
    }

    pub fn end_of_execution(&mut self, ctx: &mut EndContext<'_>) {
        for check in &mut self.checks {
            check.end_of_execution(ctx);
        }
    }
}
