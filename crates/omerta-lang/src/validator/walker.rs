//! Validation passes over a parsed transaction.

use std::collections::{HashMap, HashSet};

use crate::ast::{Action, DeclKind, Schema, Transaction, TypeRef};

use super::issue::{ValidationErrorKind, ValidationResult};
use super::symbols::SymbolTable;

/// Type names accepted in fields, parameters and return types.
pub const TYPE_VOCABULARY: &[&str] = &[
    "bool",
    "int",
    "uint",
    "string",
    "bytes",
    "hash",
    "signature",
    "pubkey",
    "address",
    "amount",
    "timestamp",
    "duration",
    "unit",
    "list",
    "map",
    "option",
];

/// Validate one transaction.
pub fn validate(tx: &Transaction) -> ValidationResult {
    Validator::new(tx).run()
}

/// Validate every transaction of a schema, in order.
///
/// Transaction names must be unique across the schema.
pub fn validate_schema(schema: &Schema) -> ValidationResult {
    let mut result = ValidationResult::default();
    for (_, tx_result) in validate_each(schema) {
        result.extend(tx_result);
    }
    result
}

/// Validate each transaction, pairing it with its own result.
///
/// A repeated transaction name is reported in the result of the repeat.
pub fn validate_each(schema: &Schema) -> Vec<(&Transaction, ValidationResult)> {
    let mut seen = HashMap::new();
    schema
        .transactions
        .iter()
        .map(|tx| {
            let mut result = ValidationResult::default();
            if let Some(first) = seen.get(tx.name.as_str()) {
                result.push(
                    ValidationErrorKind::DuplicateDeclaration {
                        name: tx.name.clone(),
                        category: "transaction",
                        first_span: *first,
                    },
                    tx.span,
                );
            } else {
                seen.insert(tx.name.as_str(), tx.span);
            }
            result.extend(validate(tx));
            (tx, result)
        })
        .collect()
}

/// Runs the passes for a single transaction, accumulating issues.
struct Validator<'a> {
    tx: &'a Transaction,
    symbols: SymbolTable,
    result: ValidationResult,
}

impl<'a> Validator<'a> {
    fn new(tx: &'a Transaction) -> Self {
        Self {
            tx,
            symbols: SymbolTable::default(),
            result: ValidationResult::default(),
        }
    }

    fn run(mut self) -> ValidationResult {
        self.collect_symbols();
        self.resolve_references();
        self.check_structure();
        self.check_calls_and_types();
        tracing::debug!(
            transaction = %self.tx.name,
            errors = self.result.error_count(),
            warnings = self.result.warning_count(),
            "validated transaction"
        );
        self.result
    }

    /// Pass 1: one namespace per category, duplicates reported at the repeat.
    fn collect_symbols(&mut self) {
        let (symbols, duplicates) = SymbolTable::collect(self.tx);
        for dup in duplicates {
            self.result.push(
                ValidationErrorKind::DuplicateDeclaration {
                    name: dup.name,
                    category: dup.kind.as_str(),
                    first_span: dup.first,
                },
                dup.duplicate,
            );
        }
        self.symbols = symbols;
    }

    /// Pass 2: every reference names a declaration of the right category.
    fn resolve_references(&mut self) {
        for msg in &self.tx.messages {
            for endpoint in [&msg.sender, &msg.receiver] {
                if !self.symbols.resolves(DeclKind::Actor, &endpoint.name) {
                    self.result.push(
                        ValidationErrorKind::UnresolvedReference {
                            name: endpoint.name.clone(),
                            expected: DeclKind::Actor,
                        },
                        endpoint.span,
                    );
                }
            }
        }

        for (_, stmt) in self.tx.statements() {
            let (target, kind) = stmt.action.target();
            if !self.symbols.resolves(kind, &target.name) {
                self.result.push(
                    ValidationErrorKind::UnresolvedReference {
                        name: target.name.clone(),
                        expected: kind,
                    },
                    target.span,
                );
            }
        }
    }

    /// Pass 3: required declarations and control-flow shape.
    fn check_structure(&mut self) {
        let tx = self.tx;
        if tx.actors.is_empty() {
            self.result.push(
                ValidationErrorKind::MissingActor {
                    transaction: tx.name.clone(),
                },
                tx.span,
            );
        }
        if tx.messages.is_empty() {
            self.result.push(
                ValidationErrorKind::MissingMessage {
                    transaction: tx.name.clone(),
                },
                tx.span,
            );
        }

        if !tx.uses_transitions() {
            return;
        }
        if !tx.blocks.iter().any(|b| b.entry) {
            self.result.push(
                ValidationErrorKind::MissingEntryBlock {
                    transaction: tx.name.clone(),
                },
                tx.span,
            );
            return;
        }

        let reachable = reachable_blocks(tx);
        for block in &tx.blocks {
            if !reachable.contains(block.name.as_str()) {
                self.result.push(
                    ValidationErrorKind::UnreachableBlock {
                        name: block.name.clone(),
                    },
                    block.span,
                );
            }
        }
    }

    /// Pass 4: call arity and declared types.
    fn check_calls_and_types(&mut self) {
        let tx = self.tx;
        for (_, stmt) in tx.statements() {
            let Action::Call { function, args } = &stmt.action else {
                continue;
            };
            // Unresolved calls were reported in pass 2.
            let Some(decl) = tx.functions.iter().find(|f| f.name == function.name) else {
                continue;
            };
            if decl.params.len() != args.len() {
                self.result.push(
                    ValidationErrorKind::ArityMismatch {
                        function: function.name.clone(),
                        expected: decl.params.len(),
                        actual: args.len(),
                    },
                    stmt.span,
                );
            }
        }

        for msg in &tx.messages {
            for field in &msg.fields {
                self.check_type(&field.ty);
            }
        }
        for func in &tx.functions {
            for param in &func.params {
                self.check_type(&param.ty);
            }
            self.check_type(&func.returns);
        }
    }

    fn check_type(&mut self, ty: &TypeRef) {
        if !TYPE_VOCABULARY.contains(&ty.name.as_str()) {
            self.result.push(
                ValidationErrorKind::UnknownType {
                    name: ty.name.clone(),
                },
                ty.span,
            );
        }
        for arg in &ty.args {
            self.check_type(arg);
        }
    }
}

/// Names of blocks reachable from any entry block along `goto` edges.
fn reachable_blocks(tx: &Transaction) -> HashSet<&str> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for (block, stmt) in tx.statements() {
        if let Action::Goto(target) = &stmt.action {
            edges
                .entry(block.name.as_str())
                .or_default()
                .push(target.name.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut work: Vec<&str> = tx
        .blocks
        .iter()
        .filter(|b| b.entry)
        .map(|b| b.name.as_str())
        .collect();

    while let Some(name) = work.pop() {
        if !visited.insert(name) {
            continue;
        }
        if let Some(targets) = edges.get(name) {
            work.extend(targets.iter().filter(|t| !visited.contains(*t)));
        }
    }
    visited
}
