//! Artifact generation from validated transactions.
//!
//! Backends implement [`Generator`]; [`run_generator`] owns the shared steps:
//! load, validate, render, write atomically. Two reference backends ship
//! here: Markdown documentation and Python simulation stubs.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ast::{Action, Transaction, TypeRef};
use crate::config::ProtocolConfig;
use crate::lint::{Case, write_atomic};
use crate::parser::{FrontendError, load_transaction_ast};
use crate::validator::validate;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    /// The transaction parsed but failed validation.
    #[error("{} has {errors} validation error(s); first: {first}", path.display())]
    Invalid {
        path: PathBuf,
        errors: usize,
        first: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("formatting failed")]
    Format(#[from] std::fmt::Error),
}

/// A backend that turns a transaction into one output file.
pub trait Generator {
    /// Short name for logs, e.g. `markdown`.
    fn kind(&self) -> &'static str;

    /// File name of the artifact for `tx_dir`.
    fn file_name(&self, tx_dir: &Path) -> String;

    /// Output directory used when the caller names none.
    fn default_dir(&self, tx_dir: &Path, config: &ProtocolConfig) -> PathBuf;

    /// Render the artifact text.
    fn render(&self, tx: &Transaction) -> Result<String, GenerateError>;

    /// Full output path: `out_dir` (or the default) joined with the file name.
    fn output_path(&self, tx_dir: &Path, out_dir: Option<&Path>, config: &ProtocolConfig) -> PathBuf {
        let dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.default_dir(tx_dir, config),
        };
        dir.join(self.file_name(tx_dir))
    }
}

/// Load `<tx_dir>/transaction.omt`, refuse it if invalid, render and write
/// to `output`. Parent directories are created as needed.
pub fn run_generator(
    generator: &dyn Generator,
    tx_dir: &Path,
    output: &Path,
) -> Result<(), GenerateError> {
    let tx = load_transaction_ast(tx_dir)?;
    let result = validate(&tx);
    if !result.is_ok() {
        let first = result
            .errors()
            .next()
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(GenerateError::Invalid {
            path: tx_dir.to_path_buf(),
            errors: result.error_count(),
            first,
        });
    }

    let text = generator.render(&tx)?;
    let write_err = |source| GenerateError::Write {
        path: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    write_atomic(output, &text).map_err(write_err)?;
    tracing::info!(kind = generator.kind(), path = %output.display(), "generated");
    Ok(())
}

/// Directory name as text; empty when the path has no final component.
fn dir_name(tx_dir: &Path) -> String {
    tx_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════
// Markdown
// ═══════════════════════════════════════════════════════════════════════════

/// Protocol documentation: `<tx_dir_name>.md`, next to the transaction
/// directories by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownGenerator;

impl Generator for MarkdownGenerator {
    fn kind(&self) -> &'static str {
        "markdown"
    }

    fn file_name(&self, tx_dir: &Path) -> String {
        format!("{}.md", dir_name(tx_dir))
    }

    fn default_dir(&self, tx_dir: &Path, _config: &ProtocolConfig) -> PathBuf {
        tx_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn render(&self, tx: &Transaction) -> Result<String, GenerateError> {
        let mut out = String::new();
        writeln!(out, "# {}", tx.name)?;
        if let Some(desc) = &tx.description {
            writeln!(out, "\n{desc}")?;
        }

        writeln!(out, "\n## Actors\n")?;
        writeln!(out, "| Actor | Role |")?;
        writeln!(out, "|-------|------|")?;
        for actor in &tx.actors {
            writeln!(out, "| {} | {} |", actor.name, actor.role.as_deref().unwrap_or(""))?;
        }

        writeln!(out, "\n## Messages")?;
        for msg in &tx.messages {
            writeln!(out, "\n### {}\n", msg.name)?;
            writeln!(out, "{} -> {}", msg.sender.name, msg.receiver.name)?;
            if !msg.fields.is_empty() {
                writeln!(out, "\n| Field | Type |")?;
                writeln!(out, "|-------|------|")?;
                for field in &msg.fields {
                    writeln!(out, "| {} | `{}` |", field.name, field.ty)?;
                }
            }
        }

        if !tx.functions.is_empty() {
            writeln!(out, "\n## Functions\n")?;
            for func in &tx.functions {
                let params: Vec<String> = func
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.ty))
                    .collect();
                write!(out, "- `{}({}) -> {}`", func.name, params.join(", "), func.returns)?;
                match &func.description {
                    Some(desc) => writeln!(out, ": {desc}")?,
                    None => writeln!(out)?,
                }
            }
        }

        if !tx.blocks.is_empty() {
            writeln!(out, "\n## Blocks")?;
            for block in &tx.blocks {
                let marker = if block.entry { " (entry)" } else { "" };
                writeln!(out, "\n### {}{marker}\n", block.name)?;
                for (i, stmt) in block.statements.iter().enumerate() {
                    let step = match &stmt.action {
                        Action::Send(msg) => format!("send `{}`", msg.name),
                        Action::Call { function, args } => {
                            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                            format!("call `{}({})`", function.name, args.join(", "))
                        }
                        Action::Goto(target) => format!("go to [{0}](#{1})", target.name, target.name.to_lowercase()),
                    };
                    match &stmt.guard {
                        Some(guard) => writeln!(out, "{}. {step} when `{guard}`", i + 1)?,
                        None => writeln!(out, "{}. {step}", i + 1)?,
                    }
                }
            }
        }
        Ok(out)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Python
// ═══════════════════════════════════════════════════════════════════════════

/// Simulation stubs: `<name>_generated.py`, where `name` is the directory
/// name after its first underscore (`00_escrow_lock` becomes `escrow_lock`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonGenerator;

impl Generator for PythonGenerator {
    fn kind(&self) -> &'static str {
        "python"
    }

    fn file_name(&self, tx_dir: &Path) -> String {
        let name = dir_name(tx_dir);
        let stem = match name.split_once('_') {
            Some((_, rest)) => rest,
            None => name.as_str(),
        };
        format!("{stem}_generated.py")
    }

    fn default_dir(&self, _tx_dir: &Path, config: &ProtocolConfig) -> PathBuf {
        config.python_output.clone()
    }

    fn render(&self, tx: &Transaction) -> Result<String, GenerateError> {
        let mut out = String::new();
        writeln!(out, "\"\"\"{} transaction. Generated from transaction.omt; do not edit.\"\"\"", tx.name)?;
        if let Some(desc) = &tx.description {
            writeln!(out, "# {desc}")?;
        }
        writeln!(out)?;
        writeln!(out, "from dataclasses import dataclass")?;
        writeln!(out, "from enum import Enum")?;
        writeln!(out, "from typing import Dict, List, Optional")?;
        writeln!(out)?;

        let actors: Vec<String> = tx.actors.iter().map(|a| format!("\"{}\"", a.name)).collect();
        writeln!(out, "ACTORS = [{}]", actors.join(", "))?;

        for msg in &tx.messages {
            writeln!(out, "\n\n@dataclass")?;
            writeln!(out, "class {}:", msg.name)?;
            writeln!(out, "    \"\"\"{} -> {}\"\"\"", msg.sender.name, msg.receiver.name)?;
            if msg.fields.is_empty() {
                writeln!(out, "    pass")?;
            }
            for field in &msg.fields {
                writeln!(out, "    {}: {}", field.name, python_type(&field.ty))?;
            }
        }

        for func in &tx.functions {
            let params: Vec<String> = func
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, python_type(&p.ty)))
                .collect();
            writeln!(out, "\n\ndef {}({}) -> {}:", func.name, params.join(", "), python_type(&func.returns))?;
            if let Some(desc) = &func.description {
                writeln!(out, "    \"\"\"{desc}\"\"\"")?;
            }
            writeln!(out, "    raise NotImplementedError")?;
        }

        if !tx.blocks.is_empty() {
            writeln!(out, "\n\nclass Block(Enum):")?;
            for block in &tx.blocks {
                writeln!(out, "    {} = \"{}\"", block_member(&block.name), block.name)?;
            }

            let entries: Vec<String> = tx
                .blocks
                .iter()
                .filter(|b| b.entry)
                .map(|b| format!("Block.{}", block_member(&b.name)))
                .collect();
            writeln!(out, "\n\nENTRY_BLOCKS = [{}]", entries.join(", "))?;

            writeln!(out, "\nTRANSITIONS = {{")?;
            for block in &tx.blocks {
                let targets: Vec<String> = block
                    .statements
                    .iter()
                    .filter_map(|s| match &s.action {
                        Action::Goto(target) => Some(format!("Block.{}", block_member(&target.name))),
                        _ => None,
                    })
                    .collect();
                writeln!(out, "    Block.{}: [{}],", block_member(&block.name), targets.join(", "))?;
            }
            writeln!(out, "}}")?;
        }
        Ok(out)
    }
}

/// `SettleFunds` -> `SETTLE_FUNDS`
fn block_member(name: &str) -> String {
    Case::Snake.convert(name).to_uppercase()
}

fn python_type(ty: &TypeRef) -> String {
    let arg = |i: usize| ty.args.get(i).map(python_type).unwrap_or_else(|| "object".to_string());
    match ty.name.as_str() {
        "bool" => "bool".to_string(),
        "int" | "uint" | "amount" | "timestamp" | "duration" => "int".to_string(),
        "string" | "address" => "str".to_string(),
        "bytes" | "hash" | "signature" | "pubkey" => "bytes".to_string(),
        "unit" => "None".to_string(),
        "list" => format!("List[{}]", arg(0)),
        "map" => format!("Dict[{}, {}]", arg(0), arg(1)),
        "option" => format!("Optional[{}]", arg(0)),
        _ => "object".to_string(),
    }
}
