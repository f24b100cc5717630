//! Scriptsync CLI Binary
//!
//! Command-line interface for extracting, importing and exporting script descriptors.

use anyhow::Context;
use clap::Parser;
use scriptsync::logging::init_logging;
use scriptsync::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let context = CliContext::new(cli.workspace.clone(), cli.config.clone())
        .context("Error initializing workspace")?;

    let logging = cli.logging_config(&context.config().logging);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
