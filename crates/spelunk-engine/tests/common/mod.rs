//! Shared fixture for assembling procedures by hand.
//!
//! The engine consumes prebuilt CFGs, so tests write them out block by
//! block. `ProcBuilder` wraps the bookkeeping: a class and method symbol to
//! own locals and fields, a line counter so every node gets a distinct
//! line, and the tree/symbol/cfg tables bundled into a `Procedure` at the
//! end.

#![allow(dead_code)]

use spelunk_lang::{
    Block, BlockId, CfgBuilder, LiteralValue, MethodTarget, Procedure, SymbolId, SymbolKind,
    SymbolTable, TreeArena, TreeId, TreeKind, TypeKind,
};

pub struct ProcBuilder {
    name: String,
    pub trees: TreeArena,
    pub symbols: SymbolTable,
    cfg: CfgBuilder,
    class: SymbolId,
    method: SymbolId,
    parameters: Vec<SymbolId>,
    line: u32,
}

impl ProcBuilder {
    pub fn new(name: &str) -> Self {
        let mut symbols = SymbolTable::new();
        let class = symbols.declare("Fixture", SymbolKind::Class, TypeKind::Reference, None);
        let method = symbols.declare(name, SymbolKind::Method, TypeKind::Reference, Some(class));
        ProcBuilder {
            name: name.to_string(),
            trees: TreeArena::new(),
            symbols,
            cfg: CfgBuilder::new(),
            class,
            method,
            parameters: Vec::new(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> u32 {
        self.line += 1;
        self.line
    }

    /// Declare a reference-typed formal parameter, optionally annotated
    /// `@javax.annotation.Nullable`.
    pub fn param(&mut self, name: &str, nullable: bool) -> SymbolId {
        let symbol = self.symbols.declare(
            name,
            SymbolKind::Variable,
            TypeKind::Reference,
            Some(self.method),
        );
        if nullable {
            self.symbols.annotate(symbol, "javax.annotation.Nullable");
        }
        let line = self.next_line();
        let declaration = self.trees.push(
            TreeKind::VariableDeclaration {
                symbol,
                has_initializer: false,
            },
            line,
        );
        self.symbols.set_declaration(symbol, declaration);
        self.parameters.push(symbol);
        symbol
    }

    /// Declare a method-local variable.
    pub fn local(&mut self, name: &str, ty: TypeKind) -> SymbolId {
        self.symbols
            .declare(name, SymbolKind::Variable, ty, Some(self.method))
    }

    /// Declare a field of the enclosing class, with a declaration site so
    /// the engine can reset it.
    pub fn field(&mut self, name: &str) -> SymbolId {
        let symbol = self.symbols.declare(
            name,
            SymbolKind::Variable,
            TypeKind::Reference,
            Some(self.class),
        );
        let line = self.next_line();
        let declaration = self.trees.push(
            TreeKind::VariableDeclaration {
                symbol,
                has_initializer: false,
            },
            line,
        );
        self.symbols.set_declaration(symbol, declaration);
        symbol
    }

    pub fn node(&mut self, kind: TreeKind) -> TreeId {
        let line = self.next_line();
        self.trees.push(kind, line)
    }

    pub fn node_in(&mut self, parent: TreeId, kind: TreeKind) -> TreeId {
        let line = self.next_line();
        self.trees.push_child(parent, kind, line)
    }

    pub fn ident(&mut self, symbol: SymbolId) -> TreeId {
        self.node(TreeKind::Identifier { symbol })
    }

    pub fn ident_in(&mut self, parent: TreeId, symbol: SymbolId) -> TreeId {
        self.node_in(parent, TreeKind::Identifier { symbol })
    }

    pub fn lit(&mut self, value: LiteralValue) -> TreeId {
        self.node(TreeKind::Literal { value })
    }

    pub fn lit_in(&mut self, parent: TreeId, value: LiteralValue) -> TreeId {
        self.node_in(parent, TreeKind::Literal { value })
    }

    pub fn expr_stmt(&mut self) -> TreeId {
        self.node(TreeKind::ExpressionStatement)
    }

    pub fn block(&mut self, block: Block) -> BlockId {
        self.cfg.block(block)
    }

    pub fn finish(self) -> Procedure {
        let cfg = self.cfg.build(&self.trees).expect("fixture CFG must be valid");
        Procedure {
            name: self.name,
            line: 1,
            parameters: self.parameters,
            trees: self.trees,
            symbols: self.symbols,
            body: Some(cfg),
        }
    }
}

/// Elements of the statement `<receiver>.<member>();`, in evaluation order.
pub fn deref_stmt(b: &mut ProcBuilder, receiver: SymbolId, member: &str) -> [TreeId; 3] {
    let stmt = b.expr_stmt();
    let call = b.node_in(
        stmt,
        TreeKind::MethodInvocation {
            argument_count: 0,
            target: MethodTarget::Expression,
        },
    );
    let select = b.node_in(
        call,
        TreeKind::MemberSelect {
            member: member.to_string(),
        },
    );
    let receiver = b.ident_in(select, receiver);
    [receiver, select, call]
}
