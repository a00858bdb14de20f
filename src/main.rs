//! bts-github-sync entry point.

use std::process::ExitCode;

use clap::Parser;

use bts_sync::cli::{handle_error, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match bts_sync::cli::commands::sync::execute(&cli).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            handle_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}
