//! Per-transaction symbol tables.
//!
//! Each declaration category has its own namespace: a message and a block may
//! share a name, two messages may not. Only names and first-declaration sites
//! are kept; the AST itself holds everything else.

use std::collections::HashMap;

use crate::ast::{DeclKind, Transaction};
use crate::span::Span;

/// Names declared in one category, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    order: Vec<String>,
    first: HashMap<String, Span>,
}

impl Namespace {
    /// Record a declaration.
    ///
    /// Returns the span of the earlier declaration when the name is taken.
    pub fn declare(&mut self, name: &str, span: Span) -> Result<(), Span> {
        if let Some(first) = self.first.get(name) {
            return Err(*first);
        }
        self.first.insert(name.to_string(), span);
        self.order.push(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first.contains_key(name)
    }

    /// Distinct names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Namespaces for every declaration category of a transaction.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    actors: Namespace,
    messages: Namespace,
    blocks: Namespace,
    functions: Namespace,
}

/// A name declared twice in the same namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub name: String,
    pub kind: DeclKind,
    pub first: Span,
    pub duplicate: Span,
}

impl SymbolTable {
    /// Build the table for a transaction.
    ///
    /// Every declaration after the first with the same name in the same
    /// category is returned as a [`Redeclaration`], in source order per
    /// category.
    pub fn collect(tx: &Transaction) -> (Self, Vec<Redeclaration>) {
        let mut table = SymbolTable::default();
        let mut duplicates = Vec::new();
        for decl in tx.declarations() {
            let kind = decl.kind();
            if let Err(first) = table.namespace_mut(kind).declare(decl.name(), decl.span()) {
                duplicates.push(Redeclaration {
                    name: decl.name().to_string(),
                    kind,
                    first,
                    duplicate: decl.span(),
                });
            }
        }
        (table, duplicates)
    }

    pub fn namespace(&self, kind: DeclKind) -> &Namespace {
        match kind {
            DeclKind::Actor => &self.actors,
            DeclKind::Message => &self.messages,
            DeclKind::Block => &self.blocks,
            DeclKind::Function => &self.functions,
        }
    }

    fn namespace_mut(&mut self, kind: DeclKind) -> &mut Namespace {
        match kind {
            DeclKind::Actor => &mut self.actors,
            DeclKind::Message => &mut self.messages,
            DeclKind::Block => &mut self.blocks,
            DeclKind::Function => &mut self.functions,
        }
    }

    /// Is `name` declared in the `kind` namespace?
    pub fn resolves(&self, kind: DeclKind, name: &str) -> bool {
        self.namespace(kind).contains(name)
    }
}
