//! CLI bootstrap - the composition root.
//!
//! Builds the [`LaunchConfig`] from its layers and wires the runtime
//! launcher to the console printer. Layers, lowest priority first:
//!
//! 1. the preset chosen by the subcommand
//! 2. `devlaunch.json` in the project directory
//! 3. environment (`.env` and `DEVLAUNCH_*`, read by clap)
//! 4. command-line flags

use std::sync::Arc;

use anyhow::Context;
use devlaunch_core::{
    CleanupMode, LaunchConfig, LaunchEventEmitter, ScanPolicy, load_settings,
    resolve_project_root, settings_file_path,
};
use devlaunch_runtime::Launcher;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::parser::Cli;

/// Resolve the full launch configuration for this invocation.
///
/// # Errors
///
/// Fails when the project directory does not exist or the settings file
/// cannot be read, parsed or validated.
pub fn build_config(cli: &Cli) -> Result<LaunchConfig, CliError> {
    let project_root = resolve_project_root(cli.project_dir.as_deref())
        .context("Cannot use project directory")?;

    let mut config = LaunchConfig::from_preset(cli.preset(), &project_root);

    // The policy kind is chosen before settings so range overrides apply to it
    if cli.avoid_common_ports {
        config = config.with_scan(ScanPolicy::avoid_common_ports());
    }

    let settings_path = settings_file_path(&project_root);
    if let Some(settings) = load_settings(&settings_path)
        .with_context(|| format!("Invalid settings in {}", settings_path.display()))?
    {
        debug!(path = %settings_path.display(), "Loaded settings file");
        config = settings.apply_to(config);
    }

    if let Some(port) = cli.base_port {
        if config.scan.uses_avoid_list() {
            warn!(port, "--base-port has no effect when avoiding common ports");
        }
        config = config.with_base_port(port);
    }
    if cli.no_kill {
        config = config.with_kill_existing(false);
    }
    if cli.full_clean {
        config = config.with_cleanup(CleanupMode::FullDevDir);
    }

    debug!(?config, "Resolved launch configuration");
    Ok(config)
}

/// Compose the launcher with the real OS adapters.
pub fn compose(config: LaunchConfig, events: Arc<dyn LaunchEventEmitter>) -> Launcher {
    Launcher::new(config, events)
}

/// Install the diagnostics subscriber on stderr.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` applies, defaulting to
/// `warn` so status lines stay uncluttered.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
