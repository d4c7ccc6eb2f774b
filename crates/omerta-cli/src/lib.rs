//! omerta: command-line front end for the Omerta transaction language.
//!
//! ```bash
//! omerta lint protocol/transactions/00_escrow_lock/transaction.omt
//! omerta lint --all --fix
//! omerta generate protocol/transactions/00_escrow_lock --markdown --python
//! omerta regenerate -v --transaction 00_escrow_lock
//! ```
//!
//! Each command writes its report to `out`, problems to `err`, and returns
//! the process exit status. Only unexpected failures surface as `Err`.

use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod generate;
pub mod lint;
pub mod regenerate;

#[derive(Debug, Parser)]
#[command(name = "omerta")]
#[command(about = "Lint and generate artifacts from Omerta transaction definitions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lint transaction files for errors and warnings.
    Lint(lint::LintArgs),
    /// Generate documentation and Python code from one transaction.
    Generate(generate::GenerateArgs),
    /// Regenerate artifacts for every transaction in a protocol tree.
    Regenerate(regenerate::RegenerateArgs),
}

/// Run a parsed command line.
pub fn run(cli: Cli, out: &mut dyn Write, err: &mut dyn Write) -> Result<u8> {
    match cli.command {
        Command::Lint(args) => lint::run(&args, out, err),
        Command::Generate(args) => generate::run(&args, out, err),
        Command::Regenerate(args) => regenerate::run(&args, out, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["omerta", "lint", "--all", "--fix"]).expect("parses");
        assert!(matches!(cli.command, Command::Lint(ref a) if a.all && a.fix));

        let cli = Cli::try_parse_from(["omerta", "generate", "tx", "--markdown"]).expect("parses");
        assert!(matches!(cli.command, Command::Generate(ref a) if a.markdown && !a.python));

        let cli = Cli::try_parse_from(["omerta", "regenerate", "-v", "-t", "00_a"]).expect("parses");
        assert!(
            matches!(cli.command, Command::Regenerate(ref a) if a.verbose && a.transaction.as_deref() == Some("00_a"))
        );
    }

    #[test]
    fn exclusive_regenerate_flags_conflict() {
        let parsed = Cli::try_parse_from(["omerta", "regenerate", "--markdown-only", "--python-only"]);
        assert!(parsed.is_err());
    }
}
