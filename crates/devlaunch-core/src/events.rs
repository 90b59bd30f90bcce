//! Launch lifecycle events.
//!
//! Stages report what they did through a [`LaunchEventEmitter`] rather than
//! printing. The CLI renders events as console status lines; tests record
//! them; contexts that do not care use [`NoopEmitter`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Preset;
use crate::lifecycle::ShutdownSignal;
use crate::scan::PortSelection;

/// Something observable that happened while launching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchEvent {
    /// The launcher started running the given preset.
    Started { preset: Preset },

    /// A stale lock file was deleted.
    LockFileRemoved { path: PathBuf },

    /// The development build directory was deleted.
    DevDirRemoved { path: PathBuf },

    /// A cleanup step failed; startup continues.
    CleanupFailed { path: PathBuf, reason: String },

    /// Processes matching the reap pattern were found and will be terminated.
    ExistingProcessesFound { pattern: String, count: usize },

    /// Listing or killing processes failed; startup continues.
    ReapFailed { reason: String },

    /// The sequential scan's base port was taken.
    BasePortBusy { base: u16, next: u16 },

    /// A port was chosen and the server is about to be spawned.
    ServerStarting {
        selection: PortSelection,
        local_url: String,
        network_url: String,
        avoided_common_ports: bool,
    },

    /// The server process was created.
    ServerSpawned { pid: Option<u32> },

    /// The server process could not be created.
    SpawnFailed { command: String, reason: String },

    /// The server exited on its own with a non-zero status.
    ServerExited { code: Option<i32> },

    /// The launcher received a shutdown signal and is forwarding it.
    ShuttingDown { signal: ShutdownSignal },
}

impl LaunchEvent {
    /// Whether this event reports a problem.
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::CleanupFailed { .. } | Self::ReapFailed { .. } | Self::BasePortBusy { .. }
        )
    }

    /// Whether this event reports a fatal or propagated failure.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::SpawnFailed { .. } | Self::ServerExited { .. })
    }
}

/// Port for emitting launch events.
///
/// Fire-and-forget: implementations handle their own failures and must not
/// block the launcher.
pub trait LaunchEventEmitter: Send + Sync {
    fn emit(&self, event: LaunchEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl LaunchEventEmitter for NoopEmitter {
    fn emit(&self, _event: LaunchEvent) {
        // Intentionally do nothing
    }
}
