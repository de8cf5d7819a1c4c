//! Control-flow graph model.
//!
//! The engine consumes a prebuilt [`Cfg`]: dense basic blocks holding
//! ordered element trees, an optional terminator tree, and ordered
//! successors. Conditional blocks additionally expose their true and false
//! successors. The [`CfgBuilder`] checks the structural invariants the
//! engine assumes, so the walker never has to defend against dangling block
//! ids or half-wired branches.

use thiserror::Error;

use crate::symbol::{SymbolId, SymbolTable};
use crate::tree::{TreeArena, TreeId, TreeKind};

/// Index of a block in its [`Cfg`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A basic block: elements in evaluation order, an optional terminator, and
/// ordered successors.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub elements: Vec<TreeId>,
    pub terminator: Option<TreeId>,
    pub successors: Vec<BlockId>,
    pub true_successor: Option<BlockId>,
    pub false_successor: Option<BlockId>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, element: TreeId) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = TreeId>) -> Self {
        self.elements.extend(elements);
        self
    }

    pub fn with_terminator(mut self, terminator: TreeId) -> Self {
        self.terminator = Some(terminator);
        self
    }

    pub fn with_successor(mut self, successor: BlockId) -> Self {
        self.successors.push(successor);
        self
    }

    /// Wire a conditional block: the true successor first, then the false
    /// successor, in that order in the successor list.
    pub fn with_branches(mut self, on_true: BlockId, on_false: BlockId) -> Self {
        self.true_successor = Some(on_true);
        self.false_successor = Some(on_false);
        self.successors.push(on_true);
        self.successors.push(on_false);
        self
    }
}

/// Validation errors raised by [`CfgBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CfgError {
    #[error("control flow graph has no blocks")]
    Empty,
    #[error("entry block {0} is out of range")]
    EntryOutOfRange(u32),
    #[error("block {block} references successor {successor} which is out of range")]
    SuccessorOutOfRange { block: u32, successor: u32 },
    #[error("block {0} has a branching terminator but is missing a true or false successor")]
    MissingBranchSuccessor(u32),
    #[error("block {block} branch successor {successor} is not among its successors")]
    BranchNotASuccessor { block: u32, successor: u32 },
}

/// A validated control-flow graph.
#[derive(Debug)]
pub struct Cfg {
    blocks: Vec<Block>,
    entry: BlockId,
}

impl Cfg {
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.as_usize()]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Assembles and validates a [`Cfg`].
///
/// Blocks are appended in order and addressed by their index, so forward
/// references are written as `BlockId(n)` for a block added later.
pub struct CfgBuilder {
    blocks: Vec<Block>,
    entry: BlockId,
}

impl Default for CfgBuilder {
    fn default() -> Self {
        CfgBuilder {
            blocks: Vec::new(),
            entry: BlockId(0),
        }
    }
}

impl CfgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block; returns the id it was assigned.
    pub fn block(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    /// Set the entry block (defaults to block 0).
    pub fn entry(&mut self, entry: BlockId) -> &mut Self {
        self.entry = entry;
        self
    }

    pub fn build(self, trees: &TreeArena) -> Result<Cfg, CfgError> {
        if self.blocks.is_empty() {
            return Err(CfgError::Empty);
        }
        let len = self.blocks.len() as u32;
        if self.entry.0 >= len {
            return Err(CfgError::EntryOutOfRange(self.entry.0));
        }
        for (index, block) in self.blocks.iter().enumerate() {
            let block_id = index as u32;
            for successor in &block.successors {
                if successor.0 >= len {
                    return Err(CfgError::SuccessorOutOfRange {
                        block: block_id,
                        successor: successor.0,
                    });
                }
            }
            if let Some(terminator) = block.terminator {
                if Self::is_branching(trees.kind(terminator)) {
                    let (on_true, on_false) = match (block.true_successor, block.false_successor) {
                        (Some(t), Some(f)) => (t, f),
                        _ => return Err(CfgError::MissingBranchSuccessor(block_id)),
                    };
                    for branch in [on_true, on_false] {
                        if !block.successors.contains(&branch) {
                            return Err(CfgError::BranchNotASuccessor {
                                block: block_id,
                                successor: branch.0,
                            });
                        }
                    }
                }
            }
        }
        Ok(Cfg {
            blocks: self.blocks,
            entry: self.entry,
        })
    }

    fn is_branching(kind: &TreeKind) -> bool {
        matches!(
            kind,
            TreeKind::If { .. }
                | TreeKind::While { .. }
                | TreeKind::ConditionalAnd { .. }
                | TreeKind::ConditionalOr { .. }
                | TreeKind::Conditional { .. }
                | TreeKind::For { condition: Some(_) }
        )
    }
}

/// A procedure handed to the engine: its identity, formal parameters in
/// declaration order, the supporting tables, and an optional body.
pub struct Procedure {
    pub name: String,
    pub line: u32,
    pub parameters: Vec<SymbolId>,
    pub trees: TreeArena,
    pub symbols: SymbolTable,
    pub body: Option<Cfg>,
}

impl Procedure {
    /// Whether there is anything to explore.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|cfg| !cfg.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::LiteralValue;

    fn arena_with_if() -> (TreeArena, TreeId) {
        let mut trees = TreeArena::new();
        let cond = trees.push(
            TreeKind::Literal {
                value: LiteralValue::Boolean(true),
            },
            1,
        );
        let terminator = trees.push(TreeKind::If { condition: cond }, 1);
        (trees, terminator)
    }

    #[test]
    fn builds_a_diamond() {
        let (trees, terminator) = arena_with_if();
        let mut builder = CfgBuilder::new();
        builder.block(
            Block::new()
                .with_terminator(terminator)
                .with_branches(BlockId(1), BlockId(2)),
        );
        builder.block(Block::new().with_successor(BlockId(3)));
        builder.block(Block::new().with_successor(BlockId(3)));
        builder.block(Block::new());

        let cfg = builder.build(&trees).unwrap();
        assert_eq!(cfg.entry(), BlockId(0));
        assert_eq!(cfg.block(BlockId(0)).successors, vec![BlockId(1), BlockId(2)]);
    }

    #[test]
    fn rejects_branch_without_successors() {
        let (trees, terminator) = arena_with_if();
        let mut builder = CfgBuilder::new();
        builder.block(Block::new().with_terminator(terminator));

        assert_eq!(
            builder.build(&trees).unwrap_err(),
            CfgError::MissingBranchSuccessor(0)
        );
    }

    #[test]
    fn rejects_dangling_successor() {
        let trees = TreeArena::new();
        let mut builder = CfgBuilder::new();
        builder.block(Block::new().with_successor(BlockId(7)));

        assert_eq!(
            builder.build(&trees).unwrap_err(),
            CfgError::SuccessorOutOfRange {
                block: 0,
                successor: 7
            }
        );
    }
}
