//! Shared plumbing for the FinnPos pipeline binaries.
//!
//! Every stage reads records from standard input and writes them to standard
//! output; logs go to standard error so they never mix with records.

use std::fmt::Display;
use std::io::{self, StdinLock, StdoutLock};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}

/// Parse the command line, or print `usage` and exit with status 1.
///
/// `--help` and `--version` keep clap's normal behavior.
pub fn parse_args<C: Parser>(usage: &str) -> C {
    match C::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            eprintln!("usage: {usage}");
            std::process::exit(1);
        }
    }
}

/// Report a fatal error for `stage` as a single line.
pub fn fail(stage: &str, err: impl Display) -> ExitCode {
    eprintln!("{stage}: {err}");
    ExitCode::FAILURE
}

/// Locked standard streams for a stage that reads STDIN and writes STDOUT.
pub fn std_streams() -> (StdinLock<'static>, StdoutLock<'static>) {
    info!("reading from STDIN, writing to STDOUT");
    (io::stdin().lock(), io::stdout().lock())
}
