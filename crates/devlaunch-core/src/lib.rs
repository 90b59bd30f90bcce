//! Core domain types and port definitions for devlaunch.
//!
//! This crate holds everything about launching a development server that
//! does not touch the operating system:
//!
//! - [`config`] - launch configuration and the four built-in presets
//! - [`scan`] - scan policies and the first-fit port scanner
//! - [`settings`] - the optional `devlaunch.json` settings file
//! - [`lifecycle`] - the launcher state machine and its outcomes
//! - [`events`] - lifecycle events and the emitter port
//! - [`ports`] - trait abstractions implemented by `devlaunch-runtime`
//! - [`paths`] - lock file and build directory resolution
//!
//! Adapters (runtime, CLI) depend on this crate; it depends on none of them.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod paths;
pub mod ports;
pub mod scan;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::{
    CleanupMode, DEFAULT_GRACE_PERIOD, DEFAULT_PROCESS_PATTERN, LaunchConfig, Preset, ReapConfig,
    ServerCommand,
};
pub use error::LaunchError;
pub use events::{LaunchEvent, LaunchEventEmitter, NoopEmitter};
pub use lifecycle::{LaunchOutcome, LauncherState, LifecycleError, LifecycleEvent, ShutdownSignal};
pub use paths::{
    DEFAULT_BUILD_DIR, PathError, SETTINGS_FILE_NAME, dev_dir_path, lock_file_path,
    resolve_build_dir, resolve_project_root, settings_file_path,
};
pub use ports::{
    PortProbe, ProcessControlError, ProcessEntry, ProcessKiller, ProcessLister,
};
pub use scan::{
    AVOID_PORTS, DEFAULT_BASE_PORT, DEFAULT_SCAN_WINDOW, FALLBACK_RANGE, PREFERRED_RANGE,
    PortRange, PortSelection, ScanError, ScanPolicy, SelectionSource, find_available_port,
};
pub use settings::{LaunchSettings, SettingsError, load_settings, validate_settings};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
