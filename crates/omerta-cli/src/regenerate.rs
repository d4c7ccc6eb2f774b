//! `omerta regenerate`

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use omerta_lang::ProtocolConfig;
use omerta_lang::config::{DEFAULT_PROTOCOL_DIR, DEFAULT_PYTHON_OUTPUT, PROTOCOL_DIR_ENV};
use omerta_lang::discovery::find_transaction_dirs;
use omerta_lang::generate::{Generator, MarkdownGenerator, PythonGenerator, run_generator};

#[derive(Debug, Args)]
pub struct RegenerateArgs {
    /// Show every generated path.
    #[arg(long, short)]
    pub verbose: bool,

    /// Only process this transaction directory, e.g. `00_escrow_lock`.
    #[arg(long, short)]
    pub transaction: Option<String>,

    /// Protocol directory holding `transactions/`.
    #[arg(long, env = PROTOCOL_DIR_ENV, default_value = DEFAULT_PROTOCOL_DIR)]
    pub protocol_dir: PathBuf,

    /// Python output directory.
    #[arg(long, default_value = DEFAULT_PYTHON_OUTPUT)]
    pub python_output: PathBuf,

    /// Only regenerate markdown documentation.
    #[arg(long, conflicts_with = "python_only")]
    pub markdown_only: bool,

    /// Only regenerate Python code.
    #[arg(long)]
    pub python_only: bool,
}

pub fn run(args: &RegenerateArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<u8> {
    let config = ProtocolConfig::new(&args.protocol_dir).with_python_output(&args.python_output);
    let mut tx_dirs = find_transaction_dirs(&config).context("searching for transactions")?;
    if tx_dirs.is_empty() {
        writeln!(
            err,
            "No transaction directories found in {}",
            config.transactions_dir().display()
        )?;
        return Ok(1);
    }

    if let Some(name) = &args.transaction {
        tx_dirs.retain(|dir| dir.file_name().is_some_and(|n| n == name.as_str()));
        if tx_dirs.is_empty() {
            writeln!(err, "Transaction not found: {name}")?;
            return Ok(1);
        }
    }

    writeln!(out, "Found {} transaction(s)", tx_dirs.len())?;
    writeln!(out)?;

    let mut succeeded = 0;
    let mut failed = 0;
    for tx_dir in &tx_dirs {
        let name = tx_dir.file_name().unwrap_or_default().to_string_lossy();
        writeln!(out, "Processing: {name}")?;

        let mut ok = true;
        if !args.python_only {
            ok &= regenerate_one(&MarkdownGenerator, tx_dir, &config, args.verbose, out, err)?;
        }
        if !args.markdown_only {
            ok &= regenerate_one(&PythonGenerator, tx_dir, &config, args.verbose, out, err)?;
        }
        if ok {
            succeeded += 1;
        } else {
            failed += 1;
        }
        writeln!(out)?;
    }

    writeln!(out, "Done: {succeeded} succeeded, {failed} failed")?;
    tracing::debug!(succeeded, failed, "regenerated");
    Ok(u8::from(failed > 0))
}

/// Run one backend into its default location. Failures are reported, not
/// propagated, so the remaining transactions still run.
fn regenerate_one(
    generator: &dyn Generator,
    tx_dir: &Path,
    config: &ProtocolConfig,
    verbose: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<bool> {
    let output = generator.output_path(tx_dir, None, config);
    match run_generator(generator, tx_dir, &output) {
        Ok(()) => {
            if verbose {
                writeln!(out, "  Generated: {}", output.display())?;
            }
            Ok(true)
        }
        Err(e) => {
            let label = match generator.kind() {
                "python" => "Python",
                other => other,
            };
            writeln!(err, "  Error generating {label}: {e}")?;
            Ok(false)
        }
    }
}
