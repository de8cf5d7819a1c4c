//! Defect reporting.
//!
//! Checkers emit [`Issue`]s; the walker buffers them per execution
//! (deduplicated, since several feasible paths can reach the same defect)
//! and flushes the buffer to a [`DiagnosticSink`] when the procedure
//! completes normally. Presentation is the driver's problem.

use spelunk_lang::TreeId;

/// One reported defect.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Issue {
    /// The syntax node the defect is attached to.
    pub tree: TreeId,
    /// Source line of that node.
    pub line: u32,
    /// Stable identifier of the checker that raised the issue.
    pub check: &'static str,
    pub message: String,
}

/// Receives the issues of one completed procedure, in a deterministic
/// order.
pub trait DiagnosticSink {
    fn report(&mut self, issue: Issue);
}

impl DiagnosticSink for Vec<Issue> {
    fn report(&mut self, issue: Issue) {
        self.push(issue);
    }
}
