//! Exploded graph.
//!
//! The exploded graph interns `(program point, program state)` pairs. The
//! walker asks for a node before enqueueing; if an equal node already exists
//! the path has been explored and the enqueue is dropped. Traversal topology
//! stays implicit in the worklist, so the graph is nothing more than the
//! interning table.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::state::{ProgramPoint, ProgramState};

/// An interned `(program point, state)` pair.
#[derive(PartialEq, Eq, Debug)]
pub struct Node {
    pub point: ProgramPoint,
    pub state: ProgramState,
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.point.hash(hasher);
        self.state.hash(hasher);
    }
}

/// Interning table for exploded-graph nodes.
#[derive(Default)]
pub struct ExplodedGraph {
    nodes: FxHashSet<Rc<Node>>,
}

impl ExplodedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node for `(point, state)`, creating it if absent. The
    /// flag is true iff this lookup created the node.
    pub fn node_at(&mut self, point: ProgramPoint, state: ProgramState) -> (Rc<Node>, bool) {
        let candidate = Rc::new(Node { point, state });
        match self.nodes.get(&candidate) {
            Some(existing) => (Rc::clone(existing), false),
            None => {
                self.nodes.insert(Rc::clone(&candidate));
                (candidate, true)
            }
        }
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SymbolicValue;
    use spelunk_lang::BlockId;

    #[test]
    fn interning_deduplicates_equal_states() {
        let mut graph = ExplodedGraph::new();
        let point = ProgramPoint::new(BlockId(0), 0);

        let (first, is_new) = graph.node_at(point, ProgramState::empty());
        assert!(is_new);
        let (second, is_new) = graph.node_at(point, ProgramState::empty());
        assert!(!is_new);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn distinct_points_or_states_make_distinct_nodes() {
        let mut graph = ExplodedGraph::new();
        let a = ProgramPoint::new(BlockId(0), 0);
        let b = ProgramPoint::new(BlockId(0), 1);

        graph.node_at(a, ProgramState::empty());
        let (_, new_point) = graph.node_at(b, ProgramState::empty());
        let (_, new_state) =
            graph.node_at(a, ProgramState::empty().stack_value(SymbolicValue::TRUE_LITERAL));

        assert!(new_point);
        assert!(new_state);
        assert_eq!(graph.len(), 3);
    }
}
