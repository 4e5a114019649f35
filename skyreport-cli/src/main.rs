//! Binary crate for the `skyreport` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Mapping failures to process exit codes

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit code for usage errors and anything the core does not classify.
const GENERIC_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so the report on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = match cli::Cli::try_parse() {
        Ok(cmd) => cmd,
        // `--help` and `--version` are not errors; clap prints them and exits 0.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(GENERIC_FAILURE);
        }
    };

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<skyreport_core::Error>()
        .map_or(GENERIC_FAILURE, skyreport_core::Error::exit_code)
}
