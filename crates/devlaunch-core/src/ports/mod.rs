//! Port definitions (trait abstractions) for operating-system access.
//!
//! Ports define the interfaces the core expects from infrastructure.
//! `devlaunch-runtime` provides the real implementations; tests provide
//! scripted ones.

pub mod port_probe;
pub mod process_control;

pub use port_probe::PortProbe;
pub use process_control::{ProcessControlError, ProcessEntry, ProcessKiller, ProcessLister};
