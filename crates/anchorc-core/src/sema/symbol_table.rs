//! Per-module symbol tables.
//!
//! Backed by `indexmap::IndexMap` so lookup is O(1) but iteration still
//! sees symbols in declaration order — `anchorc-cli`'s `--dump-symbols`
//! and the editor-protocol server's outline both depend on that order
//! matching the source file.

use indexmap::IndexMap;

use crate::ast::Node;
use crate::module_graph::ModuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Func,
    Struct,
    Interface,
    Enum,
    Const,
    Var,
    Import,
}

#[derive(Debug)]
pub struct Symbol<'a> {
    pub kind: SymbolKind,
    pub name: &'a str,
    pub is_export: bool,
    pub node: &'a Node<'a>,
    /// The module the declaration actually lives in. For a local
    /// declaration this is the owning module; for an imported name it's
    /// the module the import resolved to.
    pub source: ModuleId,
}

#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    symbols: IndexMap<&'a str, Symbol<'a>>,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Inserts a symbol, returning `false` (and leaving the table
    /// unchanged) if `name` is already bound — duplicate top-level names
    /// within one module are a collect-pass error, not an overwrite.
    pub fn insert(&mut self, symbol: Symbol<'a>) -> bool {
        if self.symbols.contains_key(symbol.name) {
            return false;
        }
        self.symbols.insert(symbol.name, symbol);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Symbol<'a>> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol<'a>> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeKind, Program};
    use crate::span::Span;

    fn dummy_node(arena: &bumpalo::Bump) -> &Node<'_> {
        arena.alloc(Node::new(
            Span::synthetic(),
            NodeKind::Program(Program { declarations: vec![] }),
        ))
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let arena = bumpalo::Bump::new();
        let node = dummy_node(&arena);
        let mut table = SymbolTable::new();
        assert!(table.insert(Symbol {
            kind: SymbolKind::Func,
            name: "main",
            is_export: false,
            node,
            source: ModuleId(0),
        }));
        assert!(!table.insert(Symbol {
            kind: SymbolKind::Const,
            name: "main",
            is_export: false,
            node,
            source: ModuleId(0),
        }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let arena = bumpalo::Bump::new();
        let node = dummy_node(&arena);
        let mut table = SymbolTable::new();
        for name in ["c", "a", "b"] {
            table.insert(Symbol {
                kind: SymbolKind::Var,
                name,
                is_export: false,
                node,
                source: ModuleId(0),
            });
        }
        let names: Vec<&str> = table.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
