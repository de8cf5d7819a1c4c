//! Worklist-driven exploration of one procedure.
//!
//! The walker explores the exploded graph of a procedure: the product of
//! its CFG with the lattice of program states. The algorithm:
//!
//! ```text
//! worklist = [ (entry, s) for s in starting states ]
//! while worklist not empty:
//!     pop the front node (depth-first)
//!     if its block is a dead end: drop it
//!     if it addresses an element: run the transfer function,
//!         then enqueue the next point in the block
//!     else: run the terminator's post hooks and hand the state to
//!         every successor, splitting on branch conditions
//! notify checkers of end of execution
//! ```
//!
//! Enqueueing interns the `(point, state)` pair in the exploded graph, so a
//! path that reproduces an already-seen state at a point is not explored
//! twice. Two limits keep exploration finite on pathological input: a step
//! budget over worklist pops, and a per-path visit bound on program points
//! that folds loop unrolling.
//!
//! Checkers run before and after every element transfer. A pre-statement
//! hook may *sink* the node, pruning everything past it on this path.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use spelunk_lang::{
    AssignmentTarget, Block, Cfg, Procedure, SymbolId, TreeId, TreeKind, TypeKind,
};

use crate::checks::{
    Check, CheckContext, CheckerDispatcher, ConditionAlwaysTrueOrFalse, EndContext,
    NullDereference, Verdict,
};
use crate::config::WalkerConfig;
use crate::constraint::{Constraint, ConstraintManager, Nullness};
use crate::error::{EngineError, Result};
use crate::graph::{ExplodedGraph, Node};
use crate::report::{DiagnosticSink, Issue};
use crate::state::{ProgramPoint, ProgramState};
use crate::value::SymbolicValue;

/// What one successful exploration did.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ExecutionSummary {
    /// Worklist pops performed.
    pub steps: usize,
    /// Nodes interned in the exploded graph.
    pub nodes: usize,
    /// Issues flushed to the sink.
    pub issues: usize,
}

/// Symbolic execution walker. One walker serves many procedures in
/// sequence; everything per-procedure lives only for the duration of a
/// [`visit_method`](Walker::visit_method) call.
pub struct Walker<'s> {
    config: WalkerConfig,
    dispatcher: CheckerDispatcher,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'s> Walker<'s> {
    /// A walker with the default configuration and the two built-in
    /// checkers.
    pub fn new(sink: &'s mut dyn DiagnosticSink) -> Self {
        Walker {
            config: WalkerConfig::default(),
            dispatcher: CheckerDispatcher::new(vec![
                Box::new(ConditionAlwaysTrueOrFalse::new()),
                Box::new(NullDereference::new()),
            ]),
            sink,
        }
    }

    pub fn with_config(mut self, config: WalkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a checker after the built-ins. Dispatch order is registration
    /// order.
    pub fn register_check(&mut self, check: Box<dyn Check>) {
        self.dispatcher.push(check);
    }

    /// Explore one procedure. Issues are flushed to the sink only on normal
    /// completion; a bounded abort or internal error discards the partial
    /// buffer and leaves the walker usable for the next procedure.
    pub fn visit_method(&mut self, procedure: &Procedure) -> Result<ExecutionSummary> {
        let Some(cfg) = procedure.body.as_ref().filter(|cfg| !cfg.is_empty()) else {
            return Ok(ExecutionSummary::default());
        };
        let mut execution = Execution {
            procedure,
            cfg,
            config: &self.config,
            dispatcher: &mut self.dispatcher,
            manager: ConstraintManager::new(),
            graph: ExplodedGraph::new(),
            worklist: VecDeque::new(),
            state: ProgramState::empty(),
            steps: 0,
            issues: Vec::new(),
        };
        let summary = execution.run()?;
        for issue in execution.issues {
            self.sink.report(issue);
        }
        Ok(summary)
    }
}

/// Working set of one `visit_method` call.
struct Execution<'a> {
    procedure: &'a Procedure,
    cfg: &'a Cfg,
    config: &'a WalkerConfig,
    dispatcher: &'a mut CheckerDispatcher,
    manager: ConstraintManager,
    graph: ExplodedGraph,
    worklist: VecDeque<Rc<Node>>,
    state: ProgramState,
    steps: usize,
    issues: Vec<Issue>,
}

impl Execution<'_> {
    fn run(&mut self) -> Result<ExecutionSummary> {
        self.dispatcher.init();
        debug!(
            method = %self.procedure.name,
            line = self.procedure.line,
            "exploring exploded graph"
        );

        let entry = ProgramPoint::new(self.cfg.entry(), 0);
        for state in self.starting_states() {
            self.enqueue(entry, state)?;
        }

        while let Some(node) = self.worklist.pop_front() {
            self.steps += 1;
            if self.steps > self.config.max_steps {
                return Err(EngineError::MaximumStepsReached {
                    method: self.procedure.name.clone(),
                    limit: self.config.max_steps,
                });
            }
            let point = node.point;
            let block = self.cfg.block(point.block);
            if block.successors.is_empty() && block.terminator.is_none() {
                // Dead end; not every block reaches the exit.
                continue;
            }
            self.state = node.state.clone();
            if point.index < block.elements.len() {
                let element = block.elements[point.index];
                self.visit_element(element, block.terminator, point)?;
            } else if let Some(terminator) = block.terminator {
                self.run_post_statement(terminator);
                self.handle_block_exit(point)?;
            } else {
                self.handle_block_exit(point)?;
            }
        }

        let mut ctx = EndContext::new(self.procedure, &mut self.issues);
        self.dispatcher.end_of_execution(&mut ctx);

        Ok(ExecutionSummary {
            steps: self.steps,
            nodes: self.graph.len(),
            issues: self.issues.len(),
        })
    }

    /// One starting state per combination of nullable-parameter polarities:
    /// every parameter is bound to a fresh value, and each nullable
    /// parameter fans the states out into a null and a non-null variant.
    fn starting_states(&mut self) -> Vec<ProgramState> {
        let mut states = vec![ProgramState::empty()];
        for &parameter in &self.procedure.parameters {
            let value = self
                .manager
                .new_value(self.procedure.symbols.declaration(parameter));
            states = states.into_iter().map(|s| s.put(parameter, value)).collect();

            if self.is_nullable(parameter) {
                let mut fanned = Vec::with_capacity(states.len() * 2);
                for state in states {
                    fanned.extend(self.manager.set_constraint(
                        value,
                        &state,
                        Constraint::Nullness(Nullness::Null),
                    ));
                    fanned.extend(self.manager.set_constraint(
                        value,
                        &state,
                        Constraint::Nullness(Nullness::NotNull),
                    ));
                }
                states = fanned;
            }
        }
        states
    }

    fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.config
            .nullable_annotations
            .iter()
            .any(|name| self.procedure.symbols.has_annotation(symbol, name))
    }

    /// Transfer function for one block element.
    fn visit_element(
        &mut self,
        tree: TreeId,
        terminator: Option<TreeId>,
        point: ProgramPoint,
    ) -> Result<()> {
        let procedure = self.procedure;
        let kind = procedure.trees.kind(tree);
        debug!(kind = ?kind, line = procedure.trees.line(tree), "visiting element");

        if self.run_pre_statement(tree) == Verdict::Sink {
            // A checker sank the execution on this node.
            return Ok(());
        }

        match kind {
            TreeKind::MethodInvocation {
                argument_count,
                target,
            } => {
                if target.is_local() {
                    // Any call on the current instance may mutate fields.
                    self.reset_field_values();
                }
                let (state, _) = self.state.unstack(argument_count + 1)?;
                let result = self.manager.new_value(tree);
                self.state = state.stack_value(result);
            }

            TreeKind::LabeledStatement
            | TreeKind::ExpressionStatement
            | TreeKind::ParenthesizedExpression => {
                return Err(EngineError::internal(format!(
                    "cannot appear in a basic block: {kind:?}"
                )));
            }
            TreeKind::Switch => {
                // Legal as a terminator, malformed as an element.
                return Err(EngineError::internal(format!(
                    "cannot appear in a basic block: {kind:?}"
                )));
            }

            TreeKind::VariableDeclaration {
                symbol,
                has_initializer,
            } => {
                let symbol = *symbol;
                if *has_initializer {
                    let (state, popped) = self.state.unstack(1)?;
                    self.state = state.put(symbol, popped[0]);
                } else {
                    let in_for_each = terminator.is_some_and(|t| {
                        matches!(procedure.trees.kind(t), TreeKind::ForEach)
                    });
                    let value = if in_for_each {
                        // The loop variable is unknown but initialised.
                        Some(self.manager.new_value(tree))
                    } else {
                        match procedure.symbols.type_of(symbol) {
                            TypeKind::Boolean => Some(SymbolicValue::FALSE_LITERAL),
                            TypeKind::Reference => Some(SymbolicValue::NULL_LITERAL),
                            TypeKind::Numeric => None,
                        }
                    };
                    if let Some(value) = value {
                        self.state = self.state.put(symbol, value);
                    }
                }
            }

            TreeKind::TypeCast { to_primitive } => {
                if *to_primitive {
                    // A primitive cast drops reference-level knowledge.
                    let (state, _) = self.state.unstack(1)?;
                    self.state = state.stack_value(self.manager.new_value(tree));
                }
            }

            TreeKind::Assignment { target } => {
                if let AssignmentTarget::Identifier(symbol) = target {
                    let (state, popped) = self.state.unstack(2)?;
                    let value = popped[1];
                    self.state = state.put(*symbol, value).stack_value(value);
                }
                // Field and array-element targets leave the store untouched.
            }

            TreeKind::ArrayAccess => {
                let (state, _) = self.state.unstack(2)?;
                self.state = state.stack_value(self.manager.new_value(tree));
            }

            TreeKind::NewArray { initializer_count } => {
                let (state, _) = self.state.unstack(*initializer_count)?;
                let value = self.manager.new_value(tree);
                let state = state.stack_value(value);
                self.state = self.manager.set_single_constraint(
                    value,
                    &state,
                    Constraint::Nullness(Nullness::NotNull),
                )?;
            }

            TreeKind::NewClass { argument_count } => {
                let (state, _) = self.state.unstack(*argument_count)?;
                let value = self.manager.new_value(tree);
                let state = state.stack_value(value);
                self.state = self.manager.set_single_constraint(
                    value,
                    &state,
                    Constraint::Nullness(Nullness::NotNull),
                )?;
            }

            TreeKind::BinaryOperator { .. } => {
                let (state, operands) = self.state.unstack(2)?;
                let value = self.manager.new_value(tree);
                self.manager.record_computed_from(value, operands);
                self.state = state.stack_value(value);
            }

            TreeKind::UnaryOperator { .. } => {
                let (state, operands) = self.state.unstack(1)?;
                let value = self.manager.new_value(tree);
                self.manager.record_computed_from(value, operands);
                self.state = state.stack_value(value);
            }

            TreeKind::Identifier { symbol } => {
                let symbol = *symbol;
                let value = match self.state.value_of(symbol) {
                    Some(value) => value,
                    None => {
                        // First sight of a free variable or field.
                        let value = self.manager.new_value(tree);
                        self.state = self.state.put(symbol, value);
                        value
                    }
                };
                self.state = self.state.stack_value(value);
            }

            TreeKind::MemberSelect { member } => {
                if member != "class" {
                    let (state, _) = self.state.unstack(1)?;
                    self.state = state;
                }
                // The `.class` idiom has no evaluated qualifier to pop.
                self.state = self.state.stack_value(self.manager.new_value(tree));
            }

            TreeKind::Literal { value } => {
                let value = self.manager.eval_literal(*value, tree);
                self.state = self.state.stack_value(value);
            }

            TreeKind::Lambda | TreeKind::MethodReference => {
                self.state = self.state.stack_value(self.manager.new_value(tree));
            }

            // Any other kind leaves the state alone; hooks still fire.
            _ => {}
        }

        self.run_post_statement(tree);

        if procedure.trees.has_expression_statement_parent(tree) {
            // Discard the statement's temporaries.
            self.state = self.state.clear_stack();
        }

        self.enqueue(point.next(), self.state.clone())
    }

    fn run_pre_statement(&mut self, tree: TreeId) -> Verdict {
        let mut ctx = CheckContext::new(
            self.state.clone(),
            &mut self.manager,
            self.procedure,
            &mut self.issues,
        );
        let verdict = self.dispatcher.pre_statement(tree, &mut ctx);
        self.state = ctx.state;
        verdict
    }

    fn run_post_statement(&mut self, tree: TreeId) {
        let mut ctx = CheckContext::new(
            self.state.clone(),
            &mut self.manager,
            self.procedure,
            &mut self.issues,
        );
        self.dispatcher.post_statement(tree, &mut ctx);
        self.state = ctx.state;
    }

    /// Replace every field binding with a fresh unconstrained value. Any
    /// call on the current instance (and any synchronized entry) may have
    /// mutated fields in unknown ways.
    fn reset_field_values(&mut self) {
        let mut values = self.state.values_map();
        let mut changed = false;
        for (symbol, _) in self.state.values() {
            if self.procedure.symbols.is_field(symbol) {
                if let Some(declaration) = self.procedure.symbols.declaration(symbol) {
                    values.insert(symbol, self.manager.supersede_value(declaration));
                    changed = true;
                }
            }
        }
        if changed {
            self.state = self.state.with_values(values);
        }
    }

    fn handle_block_exit(&mut self, point: ProgramPoint) -> Result<()> {
        let block = self.cfg.block(point.block);
        if let Some(terminator) = block.terminator {
            match self.procedure.trees.kind(terminator) {
                TreeKind::If { condition }
                | TreeKind::ConditionalAnd { condition }
                | TreeKind::ConditionalOr { condition }
                | TreeKind::Conditional { condition } => {
                    return self.handle_branch(block, *condition, true);
                }
                TreeKind::While { condition } => {
                    // Deliberate `while (true)` style loops should not be
                    // flagged as always-true.
                    let check_path =
                        !self.procedure.trees.kind(*condition).is_boolean_literal();
                    return self.handle_branch(block, *condition, check_path);
                }
                TreeKind::For {
                    condition: Some(condition),
                } => {
                    return self.handle_branch(block, *condition, false);
                }
                TreeKind::For { condition: None } => {
                    // No condition to split on; falls through to the
                    // unconditional fan-out.
                }
                TreeKind::Synchronized => {
                    self.reset_field_values();
                }
                _ => {}
            }
        }
        // Unconditional jumps, condition-less for, synchronized.
        for &successor in &block.successors {
            self.enqueue(ProgramPoint::new(successor, 0), self.state.clone())?;
        }
        Ok(())
    }

    /// Split the current state on the condition result at the top of the
    /// stack and hand each feasible side to its successor, with the branch
    /// outcome pushed as a literal.
    fn handle_branch(&mut self, block: &Block, condition: TreeId, check_path: bool) -> Result<()> {
        let (true_successor, false_successor) =
            match (block.true_successor, block.false_successor) {
                (Some(t), Some(f)) => (t, f),
                _ => {
                    return Err(EngineError::internal(
                        "branching terminator without branch successors",
                    ));
                }
            };

        let (false_states, true_states) = self.manager.assume_dual(&self.state)?;
        for state in false_states {
            let state = state.stack_value(SymbolicValue::FALSE_LITERAL);
            self.enqueue(ProgramPoint::new(false_successor, 0), state)?;
            if check_path {
                self.dispatcher.condition_evaluated(condition, false);
            }
        }
        for state in true_states {
            let state = state.stack_value(SymbolicValue::TRUE_LITERAL);
            self.enqueue(ProgramPoint::new(true_successor, 0), state)?;
            if check_path {
                self.dispatcher.condition_evaluated(condition, true);
            }
        }
        Ok(())
    }

    /// Intern `(point, state)` and push the node onto the worklist front if
    /// it is new. Drops the enqueue silently when the point's per-path visit
    /// bound is exhausted; aborts when the state space is blowing up.
    fn enqueue(&mut self, point: ProgramPoint, state: ProgramState) -> Result<()> {
        let visits = state.times_visited(point);
        if visits > self.config.max_point_visits {
            debug!(%point, "enqueue dropped: loop unroll bound reached");
            return Ok(());
        }
        if self.is_graph_too_big(&state) {
            return Err(EngineError::ExplodedGraphTooBig {
                method: self.procedure.name.clone(),
                constraints: state.constraints_len(),
            });
        }
        let state = state.with_visited(point, visits + 1);
        let (node, is_new) = self.graph.node_at(point, state);
        if !is_new {
            // Enqueued earlier.
            return Ok(());
        }
        self.worklist.push_front(node);
        Ok(())
    }

    fn is_graph_too_big(&self, state: &ProgramState) -> bool {
        // Flag an explosion only once both the frontier and the constraint
        // store are large.
        self.steps + self.worklist.len() > self.config.max_steps / 2
            && state.constraints_len() > self.config.constraints_soft_limit
    }
}
