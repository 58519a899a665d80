//! Put every analyzer label in the label column, current label first.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use finnpos_normalize::run_cue;
use finnpos_tools::{fail, init_tracing, parse_args, std_streams};
use tracing::info;

const STAGE: &str = "finnpos-omorfi-labels";

#[derive(Parser)]
#[command(name = STAGE, version)]
#[command(about = "Cue the tagger with the analyzer's candidate labels")]
struct Cli {}

fn main() -> ExitCode {
    let _cli: Cli = parse_args(STAGE);
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(STAGE, format!("{err:#}")),
    }
}

fn run() -> Result<()> {
    let (input, output) = std_streams();
    let summary = run_cue(input, output)?;
    info!(
        "wrote {} sentences, {} tokens",
        summary.sentences, summary.tokens
    );
    Ok(())
}
