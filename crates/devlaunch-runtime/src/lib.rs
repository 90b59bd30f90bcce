//! Process runtime and OS-level concerns for devlaunch.
//!
//! This crate implements the ports defined in `devlaunch-core` against the
//! real operating system and wires the launch stages together:
//!
//! 1. [`cleanup`] - remove stale lock state from a previous run
//! 2. [`process`] - reap leftover dev servers by name
//! 3. [`probe`] - bind-and-release port probing for the scanner
//! 4. [`spawn`] - build and start the dev server command
//! 5. [`signals`] - listen for shutdown signals and forward them
//!
//! [`Launcher`] runs the stages in that fixed order.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod cleanup;
pub mod launcher;
pub mod network;
pub mod probe;
pub mod process;
pub mod signals;
pub mod spawn;

pub use cleanup::{CleanupReport, cleanup_stale_state};
pub use launcher::{Launcher, supervise};
pub use network::{discover_lan_address, local_url, network_url};
pub use probe::{TcpPortProbe, is_port_available};
pub use process::{
    PlatformProcessControl, PosixProcessControl, ReapOutcome, WindowsProcessControl,
    platform_process_control, reap_existing,
};
pub use signals::{forward_interrupt, wait_for_shutdown_signal};
pub use spawn::{build_server_command, spawn_server};

// Silence unused dev-dependency warnings
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
