//! `omerta generate`

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use omerta_lang::ProtocolConfig;
use omerta_lang::generate::{Generator, MarkdownGenerator, PythonGenerator, run_generator};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Directory containing transaction.omt.
    pub tx_dir: PathBuf,

    /// Generate markdown documentation.
    #[arg(long)]
    pub markdown: bool,

    /// Generate Python simulation code.
    #[arg(long)]
    pub python: bool,

    /// Output directory for every artifact.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: &GenerateArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<u8> {
    if !args.tx_dir.exists() {
        writeln!(err, "Error: Directory not found: {}", args.tx_dir.display())?;
        return Ok(1);
    }
    if !args.markdown && !args.python {
        writeln!(out, "Specify --markdown and/or --python to generate output")?;
        return Ok(1);
    }

    let config = ProtocolConfig::default();
    let mut generators: Vec<&dyn Generator> = Vec::new();
    if args.markdown {
        generators.push(&MarkdownGenerator);
    }
    if args.python {
        generators.push(&PythonGenerator);
    }

    for generator in generators {
        let output = generator.output_path(&args.tx_dir, args.output_dir.as_deref(), &config);
        if let Err(e) = run_generator(generator, &args.tx_dir, &output) {
            writeln!(err, "Error: {e}")?;
            return Ok(1);
        }
        writeln!(out, "Generated: {}", output.display())?;
    }
    Ok(0)
}
