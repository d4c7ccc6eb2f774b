//! Validation issue types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ast::DeclKind;
use crate::span::Span;

/// How serious an issue is.
///
/// Errors fail validation; warnings are reported but do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What the validator found. `Display` gives the human message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A name declared twice in one namespace. Reported at the second
    /// occurrence.
    #[error("duplicate {category} `{name}` (first declared at {first_span})")]
    DuplicateDeclaration {
        name: String,
        category: &'static str,
        first_span: Span,
    },

    /// A reference that names nothing in its expected category.
    #[error("unknown {expected} `{name}`")]
    UnresolvedReference { name: String, expected: DeclKind },

    #[error("transaction `{transaction}` declares no actors")]
    MissingActor { transaction: String },

    #[error("transaction `{transaction}` declares no messages")]
    MissingMessage { transaction: String },

    /// Blocks use `goto` but none is marked `entry`.
    #[error("transaction `{transaction}` uses goto but has no entry block")]
    MissingEntryBlock { transaction: String },

    #[error("block `{name}` is unreachable from any entry block")]
    UnreachableBlock { name: String },

    #[error("function `{function}` takes {expected} argument(s) but {actual} were given")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: String },
}

impl ValidationErrorKind {
    /// Stable short code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorKind::DuplicateDeclaration { .. } => "E001",
            ValidationErrorKind::UnresolvedReference { .. } => "E002",
            ValidationErrorKind::MissingActor { .. } => "E003",
            ValidationErrorKind::MissingMessage { .. } => "E004",
            ValidationErrorKind::MissingEntryBlock { .. } => "E005",
            ValidationErrorKind::ArityMismatch { .. } => "E006",
            ValidationErrorKind::UnknownType { .. } => "E007",
            ValidationErrorKind::UnreachableBlock { .. } => "W001",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            ValidationErrorKind::UnreachableBlock { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A single issue at a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub span: Span,
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, span: Span) -> Self {
        Self {
            message: kind.to_string(),
            severity: kind.default_severity(),
            kind,
            span,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.span,
            self.severity,
            self.code(),
            self.message
        )
    }
}

/// Ordered issues from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// True when no issue has error severity.
    pub fn is_ok(&self) -> bool {
        !self.errors.iter().any(ValidationError::is_error)
    }

    pub fn push(&mut self, kind: ValidationErrorKind, span: Span) {
        self.errors.push(ValidationError::new(kind, span));
    }

    pub fn extend(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.errors.len() - self.error_count()
    }

    /// Error-severity issues only.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.is_error())
    }
}
