//! CLI entry point - the composition root.
//!
//! Exits with the dev server's own code when it stops by itself, 0 after
//! forwarding a shutdown signal, and 1 when the launch fails.

use std::sync::Arc;

use clap::Parser;
use devlaunch_cli::{Cli, CliError, ConsoleEmitter, build_config, compose, init_tracing, render_fatal};
use devlaunch_core::{LaunchError, LaunchOutcome};
use tracing::debug;

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads DEVLAUNCH_* variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(&cli).await {
        Ok(outcome) => {
            debug!(?outcome, "Launcher finished");
            outcome.exit_code()
        }
        Err(err) => {
            // Spawn failures were already reported by the console printer
            if !matches!(err, CliError::Launch(LaunchError::Spawn { .. })) {
                eprintln!("{}", render_fatal(&err));
            }
            err.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<LaunchOutcome, CliError> {
    let config = build_config(cli)?;
    let launcher = compose(config, Arc::new(ConsoleEmitter::new()));
    Ok(launcher.run().await?)
}
