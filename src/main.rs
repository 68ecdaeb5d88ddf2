//! krel - GrapheneOS kernel release pipeline
//!
//! CLI entry point that dispatches to pipeline stages.

use clap::Parser;
use console::style;
use krel::cli::{Cli, Commands};
use krel::error::KrelResult;
use krel::release::gate::GateOutcome;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Reserved exit code for the deliberate skip signal
const SKIP_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> KrelResult<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("krel=warn"),
        1 => EnvFilter::new("krel=info"),
        _ => EnvFilter::new("krel=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Metadata(args) => {
            krel::cli::commands::metadata(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Gate(args) => match krel::cli::commands::gate(args)? {
            GateOutcome::Proceed => Ok(ExitCode::SUCCESS),
            GateOutcome::Skip => Ok(ExitCode::from(SKIP_EXIT_CODE)),
        },
        Commands::Publish(args) => {
            krel::cli::commands::publish(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Env(args) => {
            krel::cli::commands::env(args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
