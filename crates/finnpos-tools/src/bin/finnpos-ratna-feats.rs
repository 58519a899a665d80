//! Add contextual features to tabular records.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use finnpos_feats::{FeatureExtractor, FreqWords};
use finnpos_tools::{fail, init_tracing, parse_args, std_streams};
use tracing::info;

const STAGE: &str = "finnpos-ratna-feats";

#[derive(Parser)]
#[command(name = STAGE, version)]
#[command(about = "Extract Ratnaparkhi-style features for the FinnPos tagger")]
struct Cli {
    /// Frequent words, one per line; these get no affix features.
    freq_words: PathBuf,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args(&format!("{STAGE} freq_word_file"));
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(STAGE, format!("{err:#}")),
    }
}

fn run(cli: Cli) -> Result<()> {
    let extractor = FeatureExtractor::new(FreqWords::load(&cli.freq_words)?);

    let (input, output) = std_streams();
    let summary = extractor.run(input, output)?;
    info!(
        "wrote {} sentences, {} tokens",
        summary.sentences, summary.tokens
    );
    Ok(())
}
