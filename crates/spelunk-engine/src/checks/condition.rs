//! Detects conditions whose outcome is fixed on every feasible path.
//!
//! The walker notifies this checker each time a branch condition is found
//! feasible with a given outcome (unless the branch was evaluated with path
//! checking suppressed, as for `for`-loop conditions and boolean-literal
//! `while` conditions). A condition observed with exactly one outcome over
//! the whole exploration is constant.

use std::collections::BTreeSet;

use spelunk_lang::TreeId;

use super::{Check, EndContext};

const CHECK: &str = "condition-always-true-or-false";

#[derive(Default)]
pub struct ConditionAlwaysTrueOrFalse {
    evaluated_true: BTreeSet<TreeId>,
    evaluated_false: BTreeSet<TreeId>,
}

impl ConditionAlwaysTrueOrFalse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Check for ConditionAlwaysTrueOrFalse {
    fn name(&self) -> &'static str {
        CHECK
    }

    fn init(&mut self) {
        self.evaluated_true.clear();
        self.evaluated_false.clear();
    }

    fn condition_evaluated(&mut self, condition: TreeId, outcome: bool) {
        if outcome {
            self.evaluated_true.insert(condition);
        } else {
            self.evaluated_false.insert(condition);
        }
    }

    fn end_of_execution(&mut self, ctx: &mut EndContext<'_>) {
        for &condition in self.evaluated_true.difference(&self.evaluated_false) {
            ctx.report_issue(
                condition,
                CHECK,
                "Change this condition so that it does not always evaluate to \"true\"",
            );
        }
        for &condition in self.evaluated_false.difference(&self.evaluated_true) {
            ctx.report_issue(
                condition,
                CHECK,
                "Change this condition so that it does not always evaluate to \"false\"",
            );
        }
    }
}
