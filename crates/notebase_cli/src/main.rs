//! `notebase` command line entry point.
//!
//! # Responsibility
//! - Parse arguments, load config and wire logging before any command runs.
//! - Map command failures to a non-zero exit status.

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
