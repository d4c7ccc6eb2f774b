//! Linter: parse, validate, style-check and optionally fix `.omt` files.
//!
//! A lint run never stops at the first problem. Syntax errors are collected
//! with the recovering parser; when the file parses, validation and style
//! checks add their findings. Unresolved references with exactly one
//! near-miss candidate carry a [`Replacement`] that `--fix` applies.

mod autofix;
mod render;
mod rewrite;
mod style;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::ast::DeclKind;
use crate::parser::{SyntaxError, parse_recovering};
use crate::span::Span;
use crate::validator::{
    Severity, SymbolTable, ValidationError, ValidationErrorKind, validate_each,
};

pub use autofix::{FIX_DISTANCE, HINT_DISTANCE, Suggestion, suggest};
pub use render::{render_plain, render_pretty};
pub use rewrite::{Replacement, RewriteError, apply_replacements, write_atomic};
pub use style::{Case, StyleIssue};

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LintKind {
    /// Malformed token.
    Lex,
    /// Malformed syntax.
    Syntax { expected: Vec<String> },
    /// File could not be read or rewritten.
    Io,
    /// Semantic issue from the validator.
    Validation(ValidationErrorKind),
    NamingConvention { name: String, expected: Case },
    UnusedDeclaration { name: String, category: DeclKind },
}

impl LintKind {
    /// Stable short code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            LintKind::Lex => "E010",
            LintKind::Syntax { .. } => "E011",
            LintKind::Io => "E012",
            LintKind::Validation(kind) => kind.code(),
            LintKind::NamingConvention { .. } => "W010",
            LintKind::UnusedDeclaration { .. } => "W011",
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: LintKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// A declared name the author probably meant.
    pub suggestion: Option<String>,
    /// Edit applied by `--fix`.
    pub fix: Option<Replacement>,
}

impl Diagnostic {
    fn new(kind: LintKind, severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            span,
            suggestion: None,
            fix: None,
        }
    }

    fn io(message: impl Into<String>) -> Self {
        Self::new(LintKind::Io, Severity::Error, message, Span::default())
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(e: SyntaxError) -> Self {
        match e {
            SyntaxError::Lex(e) => Diagnostic::new(
                LintKind::Lex,
                Severity::Error,
                format!("unexpected character {:?}", e.character),
                e.span,
            ),
            SyntaxError::Parse(e) => Diagnostic::new(
                LintKind::Syntax { expected: e.expected },
                Severity::Error,
                e.message,
                e.span,
            ),
        }
    }
}

impl From<ValidationError> for Diagnostic {
    fn from(e: ValidationError) -> Self {
        Diagnostic::new(LintKind::Validation(e.kind), e.severity, e.message, e.span)
    }
}

impl From<StyleIssue> for Diagnostic {
    fn from(issue: StyleIssue) -> Self {
        match issue {
            StyleIssue::Naming {
                what,
                name,
                expected,
                span,
            } => {
                let message = format!(
                    "{what} `{name}` should be {} (`{}`)",
                    expected.as_str(),
                    expected.convert(&name)
                );
                Diagnostic::new(
                    LintKind::NamingConvention { name, expected },
                    Severity::Warning,
                    message,
                    span,
                )
            }
            StyleIssue::Unused { kind, name, span } => {
                let verb = match kind {
                    DeclKind::Message => "never sent",
                    DeclKind::Function => "never called",
                    DeclKind::Block => "never the target of a goto",
                    DeclKind::Actor => "never used",
                };
                let message = format!("{kind} `{name}` is {verb}");
                Diagnostic::new(
                    LintKind::UnusedDeclaration {
                        name,
                        category: kind,
                    },
                    Severity::Warning,
                    message,
                    span,
                )
            }
        }
    }
}

/// Lint result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintOutcome {
    pub path: PathBuf,
    /// Final diagnostics, after any fix was applied.
    pub diagnostics: Vec<Diagnostic>,
    /// Fixable diagnostics found before fixing.
    pub fixable: usize,
    /// Replacements written back to the file.
    pub fixed: usize,
}

impl LintOutcome {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// `(errors, warnings, fixable)`
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.error_count(), self.warning_count(), self.fixable)
    }
}

/// Outcomes for a batch of files, in the order they were linted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub outcomes: Vec<LintOutcome>,
}

impl LintReport {
    /// Summed `(errors, warnings, fixable)` over every file.
    pub fn totals(&self) -> (usize, usize, usize) {
        self.outcomes.iter().fold((0, 0, 0), |(e, w, f), o| {
            let (oe, ow, of) = o.counts();
            (e + oe, w + ow, f + of)
        })
    }
}

/// Lint source text, returning diagnostics in source order.
pub fn lint_source(source: &str) -> Vec<Diagnostic> {
    let recovered = parse_recovering(source);
    let mut diagnostics: Vec<Diagnostic> = recovered
        .errors
        .into_iter()
        .map(Diagnostic::from)
        .collect();

    let Some(schema) = recovered.schema else {
        return diagnostics;
    };

    for (tx, result) in validate_each(&schema) {
        let (symbols, _) = SymbolTable::collect(tx);
        for error in result.errors {
            let mut diag = Diagnostic::from(error);
            if let LintKind::Validation(ValidationErrorKind::UnresolvedReference {
                name,
                expected,
            }) = &diag.kind
            {
                if let Some(suggestion) = suggest(name, symbols.namespace(*expected).names()) {
                    if suggestion.fixable {
                        diag.fix = Some(Replacement::new(
                            diag.span.range(),
                            suggestion.name.clone(),
                        ));
                    }
                    diag.suggestion = Some(suggestion.name);
                }
            }
            diagnostics.push(diag);
        }
        diagnostics.extend(style::check(tx).into_iter().map(Diagnostic::from));
    }

    diagnostics.sort_by_key(|d| d.span.offset);
    diagnostics
}

/// Lint one file, optionally applying fixes in place.
///
/// Read and write failures become [`LintKind::Io`] diagnostics. When fixes
/// are applied the rewritten text is linted again, so the outcome describes
/// the file as it now stands; `fixable` still counts what was found first.
pub fn lint_file(path: &Path, apply_fix: bool) -> LintOutcome {
    let mut outcome = LintOutcome {
        path: path.to_path_buf(),
        diagnostics: Vec::new(),
        fixable: 0,
        fixed: 0,
    };

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read file");
            outcome
                .diagnostics
                .push(Diagnostic::io(format!("cannot read file: {e}")));
            return outcome;
        }
    };

    outcome.diagnostics = lint_source(&source);
    let fixes: Vec<Replacement> = outcome
        .diagnostics
        .iter()
        .filter_map(|d| d.fix.clone())
        .collect();
    outcome.fixable = fixes.len();
    tracing::debug!(
        path = %path.display(),
        diagnostics = outcome.diagnostics.len(),
        fixable = outcome.fixable,
        "linted"
    );

    if !apply_fix || fixes.is_empty() {
        return outcome;
    }

    let fixed = match apply_replacements(&source, &fixes) {
        Ok(fixed) => fixed,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "fixes not applied");
            return outcome;
        }
    };

    if let Err(e) = write_atomic(path, &fixed) {
        tracing::warn!(path = %path.display(), error = %e, "cannot write fixes");
        outcome
            .diagnostics
            .push(Diagnostic::io(format!("cannot write fixes: {e}")));
        return outcome;
    }

    tracing::info!(path = %path.display(), fixes = fixes.len(), "applied fixes");
    outcome.fixed = fixes.len();
    outcome.diagnostics = lint_source(&fixed);
    outcome
}

/// Lint many files in sorted path order. One failing file does not stop the
/// rest.
pub fn lint_paths(paths: &[PathBuf], apply_fix: bool) -> LintReport {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();
    LintReport {
        outcomes: sorted.into_iter().map(|p| lint_file(p, apply_fix)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPO: &str = r#"transaction Escrow {
    actor Buyer {}
    actor Seller {}
    message Offer Buyer -> Seler {}
    entry block Start {
        send Ofer
    }
}"#;

    #[test]
    fn clean_source_has_no_diagnostics() {
        let src = "transaction T { actor A {} message M A -> A {} block B { send M } }";
        assert!(lint_source(src).is_empty());
    }

    #[test]
    fn typos_are_fixable() {
        let diags = lint_source(TYPO);
        let fixes: Vec<_> = diags.iter().filter_map(|d| d.fix.as_ref()).collect();
        assert_eq!(fixes.len(), 2, "{diags:?}");
        assert_eq!(&TYPO[fixes[0].start..fixes[0].end], "Seler");
        assert_eq!(fixes[0].text, "Seller");
        assert_eq!(fixes[1].text, "Offer");
    }

    #[test]
    fn fixing_leaves_no_errors() {
        let diags = lint_source(TYPO);
        let fixes: Vec<_> = diags.iter().filter_map(|d| d.fix.clone()).collect();
        let fixed = apply_replacements(TYPO, &fixes).expect("applies");
        assert!(lint_source(&fixed).iter().all(|d| !d.is_error()));
    }

    #[test]
    fn ambiguous_typo_gets_hint_without_fix() {
        let src = "transaction T { actor Ann {} actor Ana {} message M An -> Ann {} block B { send M } }";
        let diags = lint_source(src);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert_eq!(diags[0].suggestion.as_deref(), Some("Ann"));
        assert!(diags[0].fix.is_none());
    }

    #[test]
    fn syntax_errors_skip_validation() {
        let diags = lint_source("transaction T { actor buyer { role } }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E011");
    }

    #[test]
    fn diagnostics_are_in_source_order() {
        let src = "transaction T {\n actor A {}\n message idle A -> A {}\n block B { send Nope }\n}";
        let diags = lint_source(src);
        let lines: Vec<_> = diags.iter().map(|d| d.span.line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
        assert!(diags.iter().any(|d| d.code() == "W010"));
        assert!(diags.iter().any(|d| d.code() == "W011"));
        assert!(diags.iter().any(|d| d.code() == "E002"));
    }
}
