//! Convert analyzer output on STDIN into tabular records on STDOUT.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use finnpos_normalize::{Dialect, Normalizer};
use finnpos_tools::{fail, init_tracing, parse_args, std_streams};
use tracing::info;

const STAGE: &str = "finnpos-hfst2tabular";

#[derive(Parser)]
#[command(name = STAGE, version)]
#[command(about = "Convert morphological analyzer output into FinnPos tabular records")]
struct Cli {
    /// Analyzer output format: ftb or tdt.
    dialect: Option<String>,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args(&format!("{STAGE} [ftb|tdt]"));
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(STAGE, format!("{err:#}")),
    }
}

fn run(cli: Cli) -> Result<()> {
    let dialect = match cli.dialect.as_deref() {
        Some(name) => name.parse::<Dialect>()?,
        None => Dialect::default(),
    };
    info!("converting {dialect} analyses");

    let (input, output) = std_streams();
    let summary = Normalizer::new(dialect).run(input, output)?;
    info!(
        "wrote {} sentences, {} tokens ({} unanalyzed, {} derivations and {} empty labels dropped)",
        summary.sentences,
        summary.tokens,
        summary.unanalyzed,
        summary.dropped_derivations,
        summary.dropped_empty_labels
    );
    Ok(())
}
