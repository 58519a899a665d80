//! Fill in lemmas for tagged records.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use finnpos_lemma::{LemmaResolver, Mode};
use finnpos_tools::{fail, init_tracing, parse_args, std_streams};
use tracing::info;

const STAGE: &str = "finnpos-restore-lemma";

#[derive(Parser)]
#[command(name = STAGE, version)]
#[command(about = "Restore lemmas for the labels chosen by the FinnPos tagger")]
struct Cli {
    /// Keep every equally segmented lemma, separated by `|`.
    #[arg(long, default_value_t = false)]
    all_lemmas: bool,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args(&format!("{STAGE} [--all-lemmas]"));
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(STAGE, format!("{err:#}")),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = if cli.all_lemmas {
        Mode::AllLemmas
    } else {
        Mode::FirstSeen
    };

    let (input, output) = std_streams();
    let summary = LemmaResolver::new(mode).run(input, output)?;
    info!(
        "wrote {} sentences, {} tokens, {} lemmas restored",
        summary.sentences, summary.tokens, summary.resolved
    );
    Ok(())
}
