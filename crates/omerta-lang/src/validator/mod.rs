//! Semantic validation for parsed Omerta transactions.
//!
//! The validator runs after parsing and checks what the grammar cannot:
//!
//! - **Symbols**: one namespace per declaration category; no duplicates.
//! - **References**: message endpoints name actors; `send`, `call` and
//!   `goto` name messages, functions and blocks.
//! - **Structure**: at least one actor and one message; when blocks use
//!   `goto`, an entry block exists and every block is reachable from one.
//! - **Calls and types**: argument counts match, types come from the
//!   built-in vocabulary.
//!
//! All issues are collected; validation never stops at the first one.
//!
//! # Example
//!
//! ```
//! use omerta_lang::parser::parse;
//! use omerta_lang::validator::validate_schema;
//!
//! let schema = parse("transaction T { actor A {} message M A -> B {} }").unwrap();
//! let result = validate_schema(&schema);
//! assert!(!result.is_ok());
//! assert_eq!(result.errors[0].message, "unknown actor `B`");
//! ```

mod issue;
mod symbols;
mod walker;

pub use issue::{Severity, ValidationError, ValidationErrorKind, ValidationResult};
pub use symbols::{Namespace, Redeclaration, SymbolTable};
pub use walker::{TYPE_VOCABULARY, validate, validate_each, validate_schema};
