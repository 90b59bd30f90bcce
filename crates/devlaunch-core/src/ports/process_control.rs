//! Process listing and termination ports.
//!
//! Listing and killing are separate capabilities so each can be swapped or
//! mocked on its own. Both match by command-line pattern, not by pid: the
//! launcher reaps servers started by earlier runs it never owned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A process found by a [`ProcessLister`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    /// Process id, when the platform listing exposes one.
    pub pid: Option<u32>,
    /// Command line or listing row that matched.
    pub command: String,
}

impl ProcessEntry {
    pub fn new(pid: Option<u32>, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
        }
    }
}

/// Errors from process listing or termination.
#[derive(Debug, Error)]
pub enum ProcessControlError {
    /// The platform command could not be run or reported failure.
    #[error("Command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// The operation is not available on this platform.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Lists running processes whose command line contains a pattern.
#[async_trait]
pub trait ProcessLister: Send + Sync {
    async fn list_matching(&self, pattern: &str) -> Result<Vec<ProcessEntry>, ProcessControlError>;
}

/// Terminates running processes whose command line contains a pattern.
#[async_trait]
pub trait ProcessKiller: Send + Sync {
    async fn kill_matching(&self, pattern: &str) -> Result<(), ProcessControlError>;
}
