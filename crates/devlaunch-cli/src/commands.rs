//! Launch subcommands, one per preset.

use clap::Subcommand;
use devlaunch_core::Preset;

/// Available launch variants.
///
/// Running without a subcommand is the same as `dev`.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Remove the stale lock file, stop leftover servers, pick the first free port from 3000
    Dev,

    /// Like `dev`, but delete the whole development build directory first
    Clean,

    /// Remove the stale lock file and pick the first free port from 3000
    Simple,

    /// Pick a port in 3006-3100 that avoids common development ports
    Smart,
}

impl Commands {
    pub const fn preset(self) -> Preset {
        match self {
            Self::Dev => Preset::Dev,
            Self::Clean => Preset::Clean,
            Self::Simple => Preset::Simple,
            Self::Smart => Preset::Smart,
        }
    }
}
