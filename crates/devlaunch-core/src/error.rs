//! Launcher error type.
//!
//! Only failures that stop the launcher live here. Advisory problems
//! (cleanup, reaping) are reported as events and never become errors.

use std::io;

use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::paths::PathError;
use crate::scan::ScanError;
use crate::settings::SettingsError;

/// Fatal launcher errors.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// No free port within the configured bounds.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The OS refused to create the server process.
    #[error("Failed to start development server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the running server failed.
    #[error("Failed to wait for development server: {0}")]
    Wait(#[source] io::Error),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Path(#[from] PathError),
}

impl LaunchError {
    /// Exit code for this failure. Every fatal launcher error exits 1.
    pub const fn exit_code(&self) -> i32 {
        1
    }
}
