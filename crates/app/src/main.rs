//! Inventory Application CLI

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod cli;
mod observability;

#[tokio::main]
pub async fn main() -> ExitCode {
    let _env = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(init_error) = observability::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln"
        )]
        {
            eprintln!("failed to initialise logging: {init_error}");
        }

        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(%message, "command failed");

            ExitCode::FAILURE
        }
    }
}
