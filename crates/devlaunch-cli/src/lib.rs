//! Command-line adapter for devlaunch.
//!
//! Parses arguments, layers configuration and renders launch events on the
//! console. The launch itself lives in `devlaunch-runtime`.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary in main.rs
use dotenvy as _;
use tokio as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod parser;
pub mod presentation;

pub use bootstrap::{build_config, compose, init_tracing};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
pub use presentation::{ConsoleEmitter, render, render_fatal};
