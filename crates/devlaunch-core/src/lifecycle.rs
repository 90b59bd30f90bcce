//! Launcher lifecycle state machine.
//!
//! ```text
//! Idle ──spawned──▶ Running ──shutdown signal──▶ Terminating ──detached──▶ Exited(0)
//!   │                  │
//!   │ spawn failed     └──child exited(code)──────────────────────────▶ Exited(code)
//!   └─────────────────────────────────────────────────────────────────▶ Exited(1)
//! ```
//!
//! `Terminating` does not wait for the child: once the interrupt has been
//! forwarded the launcher detaches and exits.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signals that make the launcher shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownSignal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Where the launcher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    Idle,
    Running { pid: Option<u32> },
    Terminating,
    Exited { code: i32 },
}

/// Inputs that drive [`LauncherState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Spawned { pid: Option<u32> },
    SpawnFailed,
    ChildExited { code: i32 },
    ShutdownRequested,
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Invalid lifecycle transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: LauncherState,
        event: LifecycleEvent,
    },
}

impl LauncherState {
    /// Apply `event`, returning the next state.
    pub const fn transition(self, event: LifecycleEvent) -> Result<Self, LifecycleError> {
        match (self, event) {
            (Self::Idle, LifecycleEvent::Spawned { pid }) => Ok(Self::Running { pid }),
            (Self::Idle, LifecycleEvent::SpawnFailed) => Ok(Self::Exited { code: 1 }),
            (Self::Running { .. }, LifecycleEvent::ChildExited { code }) => {
                Ok(Self::Exited { code })
            }
            (Self::Running { .. }, LifecycleEvent::ShutdownRequested) => Ok(Self::Terminating),
            (Self::Terminating, LifecycleEvent::Detached) => Ok(Self::Exited { code: 0 }),
            (from, event) => Err(LifecycleError::InvalidTransition { from, event }),
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exited { .. })
    }

    /// Whether a child process handle is live in this state.
    pub const fn has_child(self) -> bool {
        matches!(self, Self::Running { .. } | Self::Terminating)
    }
}

/// How a supervised launch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// The server exited with a status code.
    ChildExited { code: i32 },
    /// The server was killed by a signal (Unix) or ended without a code.
    ChildSignaled { signal: Option<i32> },
    /// The launcher was told to stop and forwarded an interrupt.
    Interrupted { signal: ShutdownSignal },
}

impl LaunchOutcome {
    /// Process exit code the launcher should use.
    ///
    /// Child codes are propagated verbatim; signal deaths follow the shell
    /// convention of `128 + signo`; an interrupted launcher exits 0.
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ChildExited { code } => code,
            Self::ChildSignaled {
                signal: Some(signal),
            } => 128 + signal,
            Self::ChildSignaled { signal: None } => 1,
            Self::Interrupted { .. } => 0,
        }
    }
}
