//! Launch configuration and built-in presets.
//!
//! A [`LaunchConfig`] answers every question the launcher asks: where the
//! project lives, what to clean, whether to reap leftover servers, how to
//! pick a port and what to spawn. Each launch variant is a
//! [`Preset`]; [`LaunchConfig::from_preset`] builds it and the `with_*`
//! methods adjust it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths::DEFAULT_BUILD_DIR;
use crate::scan::{DEFAULT_BASE_PORT, ScanPolicy};

/// Process command-line pattern identifying a running dev server.
pub const DEFAULT_PROCESS_PATTERN: &str = "next";

/// Pause after terminating leftover servers so the OS can release ports.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// The four launch variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Remove the lock file, reap leftover servers, scan sequentially.
    #[default]
    Dev,
    /// Remove the whole dev build directory, reap, scan sequentially.
    Clean,
    /// Remove the lock file and scan sequentially.
    Simple,
    /// Remove the lock file and scan around commonly used ports.
    Smart,
}

impl Preset {
    pub const ALL: [Self; 4] = [Self::Dev, Self::Clean, Self::Simple, Self::Smart];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Clean => "clean",
            Self::Simple => "simple",
            Self::Smart => "smart",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown preset '{s}' (expected dev, clean, simple or smart)"))
    }
}

/// What the cleanup stage deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupMode {
    /// Only `<build-dir>/dev/lock`.
    #[default]
    LockOnly,
    /// The lock file and the whole `<build-dir>/dev` tree.
    FullDevDir,
}

/// Settings for the process reaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapConfig {
    /// Substring matched against process command lines.
    pub pattern: String,
    /// Wait after issuing the kill before continuing.
    pub grace_period: Duration,
}

impl Default for ReapConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PROCESS_PATTERN.to_string(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// The development server command.
///
/// The selected port is appended as `<port_flag> <port>` and exported as
/// `PORT` in the child's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub port_flag: String,
    /// Run through the platform shell (`sh -c` / `cmd /C`).
    pub shell: bool,
}

impl ServerCommand {
    /// `npx next dev`, run through the shell on Windows where `npx` is a
    /// batch shim.
    pub fn next_dev() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["next".to_string(), "dev".to_string()],
            port_flag: "-p".to_string(),
            shell: cfg!(windows),
        }
    }

    /// Build a command from an argv-style vector. Returns `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            ..Self::next_dev()
        })
    }

    /// Arguments passed to the program for `port`.
    pub fn args_for(&self, port: u16) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(self.port_flag.clone());
        args.push(port.to_string());
        args
    }

    /// Full command line for `port`, for display and shell invocation.
    pub fn command_line(&self, port: u16) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args_for(port))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ServerCommand {
    fn default() -> Self {
        Self::next_dev()
    }
}

/// Complete launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Preset this configuration started from.
    pub preset: Preset,
    /// Working directory for cleanup and the spawned server.
    pub project_root: PathBuf,
    /// Build output directory, relative to `project_root` unless absolute.
    pub build_dir: PathBuf,
    pub cleanup: CleanupMode,
    /// Reap leftover servers before scanning.
    pub kill_existing: bool,
    pub reap: ReapConfig,
    pub scan: ScanPolicy,
    pub server: ServerCommand,
    /// Host shown in the network URL instead of the discovered LAN address.
    pub network_host: Option<String>,
}

impl LaunchConfig {
    /// Configuration for one of the built-in launch variants.
    pub fn from_preset(preset: Preset, project_root: impl Into<PathBuf>) -> Self {
        let (cleanup, kill_existing, scan) = match preset {
            Preset::Dev => (
                CleanupMode::LockOnly,
                true,
                ScanPolicy::sequential(DEFAULT_BASE_PORT),
            ),
            Preset::Clean => (
                CleanupMode::FullDevDir,
                true,
                ScanPolicy::sequential(DEFAULT_BASE_PORT),
            ),
            Preset::Simple => (
                CleanupMode::LockOnly,
                false,
                ScanPolicy::sequential(DEFAULT_BASE_PORT),
            ),
            Preset::Smart => (
                CleanupMode::LockOnly,
                false,
                ScanPolicy::avoid_common_ports(),
            ),
        };

        Self {
            preset,
            project_root: project_root.into(),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            cleanup,
            kill_existing,
            reap: ReapConfig::default(),
            scan,
            server: ServerCommand::default(),
            network_host: None,
        }
    }

    #[must_use]
    pub fn with_cleanup(mut self, cleanup: CleanupMode) -> Self {
        self.cleanup = cleanup;
        self
    }

    #[must_use]
    pub fn with_kill_existing(mut self, kill_existing: bool) -> Self {
        self.kill_existing = kill_existing;
        self
    }

    #[must_use]
    pub fn with_reap(mut self, reap: ReapConfig) -> Self {
        self.reap = reap;
        self
    }

    #[must_use]
    pub fn with_scan(mut self, scan: ScanPolicy) -> Self {
        self.scan = scan;
        self
    }

    /// Move the sequential base port. Has no effect on avoid-list policies.
    #[must_use]
    pub fn with_base_port(mut self, port: u16) -> Self {
        if let ScanPolicy::Sequential { base, .. } = &mut self.scan {
            *base = port;
        }
        self
    }

    #[must_use]
    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self
    }

    #[must_use]
    pub fn with_server(mut self, server: ServerCommand) -> Self {
        self.server = server;
        self
    }

    #[must_use]
    pub fn with_network_host(mut self, host: impl Into<String>) -> Self {
        self.network_host = Some(host.into());
        self
    }

    /// Absolute path of the build output directory.
    pub fn build_dir_path(&self) -> PathBuf {
        crate::paths::resolve_build_dir(&self.project_root, &self.build_dir)
    }
}
