//! Symbol and type information.
//!
//! A [`SymbolTable`] is a flat registry of the symbols a procedure touches:
//! its parameters, locals, the fields it reads or writes, and the methods it
//! calls. Symbols are addressed by [`SymbolId`], a small dense index, so the
//! engine can use them as ordered map keys.
//!
//! Types are collapsed to the three-way split the engine actually consumes:
//! `boolean` exactly, any other primitive, or a reference type.

use crate::tree::TreeId;

/// Index of a symbol in its [`SymbolTable`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// What a symbol names.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    /// A variable: parameter, local, or field. Which of those it is follows
    /// from the owner (fields are variables whose owner is not a method).
    Variable,
    Method,
    Class,
}

/// Declared type of a variable symbol, reduced to what the transfer
/// function distinguishes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeKind {
    /// Exactly `boolean`.
    Boolean,
    /// Any other primitive type.
    Numeric,
    /// A reference type.
    Reference,
}

impl TypeKind {
    pub fn is_primitive(self) -> bool {
        !matches!(self, TypeKind::Reference)
    }
}

struct SymbolData {
    name: String,
    kind: SymbolKind,
    owner: Option<SymbolId>,
    ty: TypeKind,
    annotations: Vec<String>,
    declaration: Option<TreeId>,
}

/// Registry of the symbols reachable from one procedure.
#[derive(Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolData>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol and return its id.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        kind: SymbolKind,
        ty: TypeKind,
        owner: Option<SymbolId>,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            name: name.into(),
            kind,
            owner,
            ty,
            annotations: Vec::new(),
            declaration: None,
        });
        id
    }

    /// Attach a fully qualified annotation name to a symbol.
    pub fn annotate(&mut self, symbol: SymbolId, fq_name: impl Into<String>) {
        self.symbols[symbol.as_usize()].annotations.push(fq_name.into());
    }

    /// Record the declaration site of a symbol. The engine uses it as the
    /// origin of superseding values when fields are reset.
    pub fn set_declaration(&mut self, symbol: SymbolId, tree: TreeId) {
        self.symbols[symbol.as_usize()].declaration = Some(tree);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn name(&self, symbol: SymbolId) -> &str {
        &self.symbols[symbol.as_usize()].name
    }

    pub fn kind(&self, symbol: SymbolId) -> SymbolKind {
        self.symbols[symbol.as_usize()].kind
    }

    pub fn type_of(&self, symbol: SymbolId) -> TypeKind {
        self.symbols[symbol.as_usize()].ty
    }

    pub fn owner(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.symbols[symbol.as_usize()].owner
    }

    pub fn declaration(&self, symbol: SymbolId) -> Option<TreeId> {
        self.symbols[symbol.as_usize()].declaration
    }

    /// Whether the symbol carries an annotation with the given fully
    /// qualified name.
    pub fn has_annotation(&self, symbol: SymbolId, fq_name: &str) -> bool {
        self.symbols[symbol.as_usize()]
            .annotations
            .iter()
            .any(|a| a == fq_name)
    }

    /// A field is a variable symbol whose owner is not a method. Parameters
    /// and locals are owned by their method symbol; anything else counts as
    /// a field.
    pub fn is_field(&self, symbol: SymbolId) -> bool {
        self.kind(symbol) == SymbolKind::Variable
            && !matches!(self.owner(symbol).map(|o| self.kind(o)), Some(SymbolKind::Method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_classification() {
        let mut table = SymbolTable::new();
        let class = table.declare("A", SymbolKind::Class, TypeKind::Reference, None);
        let method = table.declare("m", SymbolKind::Method, TypeKind::Reference, Some(class));
        let local = table.declare("x", SymbolKind::Variable, TypeKind::Reference, Some(method));
        let field = table.declare("f", SymbolKind::Variable, TypeKind::Reference, Some(class));
        let orphan = table.declare("g", SymbolKind::Variable, TypeKind::Reference, None);

        assert!(!table.is_field(local));
        assert!(table.is_field(field));
        assert!(table.is_field(orphan));
        assert!(!table.is_field(method));
    }

    #[test]
    fn annotations_match_fully_qualified_names() {
        let mut table = SymbolTable::new();
        let p = table.declare("a", SymbolKind::Variable, TypeKind::Reference, None);
        table.annotate(p, "javax.annotation.Nullable");

        assert!(table.has_annotation(p, "javax.annotation.Nullable"));
        assert!(!table.has_annotation(p, "Nullable"));
        assert!(!table.has_annotation(p, "javax.annotation.CheckForNull"));
    }
}
