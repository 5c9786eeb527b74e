//! Folio CLI Binary
//!
//! Command-line interface for the ordinal-ordered document store.

use anyhow::Context as _;
use clap::Parser;
use folio::logging;
use folio::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = CliContext::new(cli.root.clone(), cli.config.clone())
        .context("failed to open store")?;
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(Some(&cli.logging_config())) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
