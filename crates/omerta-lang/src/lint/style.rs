//! Style checks: naming conventions and unused declarations.

use std::collections::HashSet;

use crate::ast::{Action, DeclKind, Transaction};
use crate::span::Span;

/// Expected spelling of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    UpperCamel,
    Snake,
}

impl Case {
    pub fn matches(self, name: &str) -> bool {
        match self {
            Case::UpperCamel => is_upper_camel(name),
            Case::Snake => is_snake(name),
        }
    }

    /// Respell `name` in this case.
    pub fn convert(self, name: &str) -> String {
        let words = split_words(name);
        match self {
            Case::UpperCamel => words
                .iter()
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect(),
            Case::Snake => words.join("_"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Case::UpperCamel => "UpperCamelCase",
            Case::Snake => "snake_case",
        }
    }
}

/// A naming or usage finding, before it becomes a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleIssue {
    Naming {
        what: &'static str,
        name: String,
        expected: Case,
        span: Span,
    },
    Unused {
        kind: DeclKind,
        name: String,
        span: Span,
    },
}

/// Run every style check on one transaction, in source-category order.
pub fn check(tx: &Transaction) -> Vec<StyleIssue> {
    let mut issues = naming(tx);
    issues.extend(unused(tx));
    issues
}

fn naming(tx: &Transaction) -> Vec<StyleIssue> {
    let mut issues = Vec::new();
    let mut expect = |what: &'static str, name: &str, expected: Case, span: Span| {
        if !expected.matches(name) {
            issues.push(StyleIssue::Naming {
                what,
                name: name.to_string(),
                expected,
                span,
            });
        }
    };

    for actor in &tx.actors {
        expect("actor", &actor.name, Case::UpperCamel, actor.span);
    }
    for msg in &tx.messages {
        expect("message", &msg.name, Case::UpperCamel, msg.span);
        for field in &msg.fields {
            expect("field", &field.name, Case::Snake, field.span);
        }
    }
    for block in &tx.blocks {
        expect("block", &block.name, Case::UpperCamel, block.span);
    }
    for func in &tx.functions {
        expect("function", &func.name, Case::Snake, func.span);
        for param in &func.params {
            expect("parameter", &param.name, Case::Snake, param.span);
        }
    }
    issues
}

fn unused(tx: &Transaction) -> Vec<StyleIssue> {
    let mut sent = HashSet::new();
    let mut called = HashSet::new();
    let mut targeted = HashSet::new();
    for (_, stmt) in tx.statements() {
        match &stmt.action {
            Action::Send(msg) => sent.insert(msg.name.as_str()),
            Action::Call { function, .. } => called.insert(function.name.as_str()),
            Action::Goto(block) => targeted.insert(block.name.as_str()),
        };
    }

    let mut issues = Vec::new();
    for msg in &tx.messages {
        if !sent.contains(msg.name.as_str()) {
            issues.push(StyleIssue::Unused {
                kind: DeclKind::Message,
                name: msg.name.clone(),
                span: msg.span,
            });
        }
    }
    if tx.uses_transitions() {
        for block in tx.blocks.iter().filter(|b| !b.entry) {
            if !targeted.contains(block.name.as_str()) {
                issues.push(StyleIssue::Unused {
                    kind: DeclKind::Block,
                    name: block.name.clone(),
                    span: block.span,
                });
            }
        }
    }
    for func in &tx.functions {
        if !called.contains(func.name.as_str()) {
            issues.push(StyleIssue::Unused {
                kind: DeclKind::Function,
                name: func.name.clone(),
                span: func.span,
            });
        }
    }
    issues
}

fn is_upper_camel(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_snake(name: &str) -> bool {
    let trimmed = name.trim_start_matches('_');
    trimmed.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !trimmed.contains("__")
}

/// Split an identifier into lowercase words at underscores and case changes.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
