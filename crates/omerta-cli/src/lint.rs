//! `omerta lint`

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, ValueEnum};
use omerta_lang::config::{DEFAULT_PROTOCOL_DIR, PROTOCOL_DIR_ENV, ProtocolConfig};
use omerta_lang::discovery::find_all_transactions;
use omerta_lang::lint::{LintReport, lint_paths, render_plain, render_pretty};

use crate::Cli;

#[derive(Debug, Args)]
pub struct LintArgs {
    /// Files to lint.
    pub files: Vec<PathBuf>,

    /// Lint every transaction file under the protocol directory.
    #[arg(long)]
    pub all: bool,

    /// Rewrite unambiguous single-character typos in place.
    #[arg(long)]
    pub fix: bool,

    /// Protocol directory searched by --all.
    #[arg(long, env = PROTOCOL_DIR_ENV, default_value = DEFAULT_PROTOCOL_DIR)]
    pub protocol_dir: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Show annotated source snippets instead of one line per diagnostic.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run(args: &LintArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<u8> {
    let files = if args.all {
        let config = ProtocolConfig::new(&args.protocol_dir);
        let files = find_all_transactions(&config).context("searching for transaction files")?;
        if files.is_empty() {
            writeln!(out, "No transaction files found")?;
            return Ok(1);
        }
        files
    } else if !args.files.is_empty() {
        args.files.clone()
    } else {
        let mut command = Cli::command();
        if let Some(lint) = command.find_subcommand_mut("lint") {
            write!(err, "{}", lint.render_help())?;
        }
        return Ok(1);
    };

    tracing::debug!(files = files.len(), fix = args.fix, "linting");
    let report = lint_paths(&files, args.fix);
    let (errors, warnings, fixable) = report.totals();

    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            write_text(&report, args.pretty, out)?;
            if errors > 0 || warnings > 0 {
                writeln!(out, "\n{errors} error(s), {warnings} warning(s)")?;
                if fixable > 0 && !args.fix {
                    write_fix_hint(&files, fixable, out)?;
                }
            }
        }
    }

    Ok(u8::from(errors > 0))
}

fn write_text(report: &LintReport, pretty: bool, out: &mut dyn Write) -> Result<()> {
    for outcome in &report.outcomes {
        // Read back so snippets show the file as it stands after fixes.
        let source = if pretty {
            std::fs::read_to_string(&outcome.path)
                .inspect_err(|e| {
                    tracing::warn!(
                        path = %outcome.path.display(),
                        error = %e,
                        "cannot read source for snippets, printing plain diagnostics"
                    );
                })
                .ok()
        } else {
            None
        };
        match source {
            Some(source) => {
                render_pretty(&outcome.path, &source, &outcome.diagnostics, &mut *out)?;
            }
            None => {
                for diag in &outcome.diagnostics {
                    writeln!(out, "{}", render_plain(&outcome.path, diag))?;
                }
            }
        }
        if outcome.fixed > 0 {
            writeln!(
                out,
                "Fixed {} issue(s) in {}",
                outcome.fixed,
                outcome.path.display()
            )?;
        }
    }
    Ok(())
}

fn write_fix_hint(files: &[PathBuf], fixable: usize, out: &mut dyn Write) -> Result<()> {
    match files {
        [single] => {
            writeln!(out, "\n{fixable} issue(s) can be auto-fixed. Run:")?;
            writeln!(out, "  omerta lint --fix {}", single.display())?;
        }
        _ => writeln!(
            out,
            "\n{fixable} issue(s) can be auto-fixed. Run with --fix to apply."
        )?,
    }
    Ok(())
}
