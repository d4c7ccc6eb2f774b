//! omerta-lang: front-end for the Omerta transaction language.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes `.omt` source using logos
//! - **Parser**: Builds the AST from tokens using chumsky, strict or recovering
//! - **AST**: Transactions, actors, messages, blocks and functions
//! - **Validator**: Symbol, reference, structure and type checks
//! - **Lint**: Style checks, near-miss fixes and atomic rewrites
//! - **Discovery** and **Generate**: protocol tree layout and output backends

pub mod ast;
pub mod config;
pub mod discovery;
pub mod generate;
pub mod lexer;
pub mod lint;
pub mod parser;
pub mod span;
pub mod validator;

pub use ast::{Schema, Transaction};
pub use config::ProtocolConfig;
pub use parser::{
    FrontendError, ParseError, SyntaxError, load_transaction_ast, parse, parse_file,
    parse_recovering,
};
pub use span::Span;
pub use validator::{ValidationError, ValidationResult, validate, validate_schema};
