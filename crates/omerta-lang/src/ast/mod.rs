//! Abstract Syntax Tree types for Omerta.
//!
//! This module provides:
//! - AST type definitions (`types` module, re-exported at this level)
//! - Canonical source printer (`Display` impls in `pretty`)
//! - S-expression formatter for golden tests (`sexpr` module)

mod pretty;
pub mod sexpr;
mod types;

pub use crate::span::Span;
pub use types::*;
