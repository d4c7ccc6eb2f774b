//! omerta binary entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use omerta_cli::Cli;

fn main() -> Result<ExitCode> {
    // Logs go to stderr so reports on stdout stay clean (respects RUST_LOG)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("omerta_cli=info".parse()?))
        .init();

    let cli = Cli::parse();
    let mut out = std::io::stdout().lock();
    let mut err = std::io::stderr().lock();
    let code = omerta_cli::run(cli, &mut out, &mut err)?;
    Ok(ExitCode::from(code))
}
