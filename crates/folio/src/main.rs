//! Folio CLI binary.
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

use clap::Parser;
use folio::{FolioError, LogFormat, init_tracing};
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_tracing(cli.verbose, format) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<FolioError>() {
                Some(folio) => eprintln!("error[{}]: {}", folio.code(), folio),
                None => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
