//! Wireloom CLI
//!
//! Reads a JSON harness document and writes the selected output
//! artifacts (DOT, SVG, BOM TSV, HTML report) next to the input file
//! or an explicit output base path.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use wireloom::report::{self, OutputFormat};
use wireloom::{document_fingerprint, HarnessDocument};

#[derive(Parser)]
#[command(name = "wireloom-cli")]
#[command(version)]
#[command(about = "Generate wiring-harness diagrams, BOMs, and reports")]
struct Cli {
    /// JSON harness document
    input: PathBuf,

    /// Output base path (defaults to the input path without extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated output formats: gv, svg, tsv, html
    #[arg(short, long, default_value = "gv,tsv,html")]
    formats: String,
}

fn run(cli: Cli) -> Result<()> {
    let formats = cli
        .formats
        .split(',')
        .map(|name| name.trim().parse::<OutputFormat>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| anyhow::anyhow!(message))?;
    if formats.is_empty() {
        bail!("no output formats selected");
    }

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;
    let fingerprint = document_fingerprint(&raw)
        .with_context(|| format!("{} is not valid JSON", cli.input.display()))?;

    let document = HarnessDocument::from_json(&raw)
        .with_context(|| format!("cannot parse {}", cli.input.display()))?;
    let mut harness = document.build().context("harness build failed")?;

    let base = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension(""));
    report::write_outputs(&mut harness, &base, &formats, Some(&fingerprint))
        .with_context(|| format!("cannot write outputs to {}", base.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            // build/validation failures exit 2, I/O and usage 1
            if err.downcast_ref::<wireloom::HarnessError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
