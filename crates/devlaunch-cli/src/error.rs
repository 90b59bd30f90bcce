//! CLI error type and exit-code mapping.

use devlaunch_core::LaunchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The project directory or settings file could not be used.
    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),

    /// Launching or supervising the dev server failed.
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl CliError {
    /// Exit code for this failure.
    ///
    /// Every launcher failure exits 1; a child's own exit code never goes
    /// through this path.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Launch(err) => err.exit_code(),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(err)
    }
}
