//! Main CLI parser and top-level argument handling.
//!
//! Flags are global so they can be given before or after the subcommand.

use std::path::PathBuf;

use clap::Parser;
use devlaunch_core::Preset;

use crate::commands::Commands;

/// Start the web dev server on a free port after clearing stale state.
#[derive(Parser, Debug)]
#[command(name = "devlaunch")]
#[command(about = "Start the web dev server on a free port after clearing stale state")]
#[command(version)]
pub struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long = "project-dir", env = "DEVLAUNCH_PROJECT_DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// First port of the sequential scan
    #[arg(
        long = "base-port",
        env = "DEVLAUNCH_BASE_PORT",
        global = true,
        value_parser = clap::value_parser!(u16).range(1024..)
    )]
    pub base_port: Option<u16>,

    /// Scan 3006-3100 first, skipping commonly used development ports
    #[arg(long = "avoid-common-ports", global = true)]
    pub avoid_common_ports: bool,

    /// Do not stop leftover dev server processes
    #[arg(long = "no-kill", global = true)]
    pub no_kill: bool,

    /// Delete the whole development build directory, not just the lock file
    #[arg(long = "full-clean", global = true)]
    pub full_clean: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Preset selected by the subcommand, `dev` when none is given.
    pub fn preset(&self) -> Preset {
        self.command.map_or(Preset::Dev, Commands::preset)
    }
}
