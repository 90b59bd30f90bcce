//! Finding and terminating leftover dev servers.
//!
//! - [`posix`] lists with `ps` and sends `SIGTERM` to the listed pids
//! - [`windows`] lists with `tasklist` and kills with `taskkill`
//! - [`reaper`] drives either through the core ports

mod posix;
mod reaper;
mod windows;

use std::sync::Arc;

pub use posix::PosixProcessControl;
pub use reaper::{ReapOutcome, reap_existing};
pub use windows::WindowsProcessControl;

/// Process control for the platform this binary was built for.
#[cfg(windows)]
pub type PlatformProcessControl = WindowsProcessControl;

/// Process control for the platform this binary was built for.
#[cfg(not(windows))]
pub type PlatformProcessControl = PosixProcessControl;

/// Create the platform process control once at startup.
///
/// The returned value implements both `ProcessLister` and `ProcessKiller`.
pub fn platform_process_control() -> Arc<PlatformProcessControl> {
    Arc::new(PlatformProcessControl::new())
}

/// Run a listing or kill command and capture its output.
async fn run_command(
    program: &str,
    args: &[String],
) -> Result<std::process::Output, devlaunch_core::ProcessControlError> {
    tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| devlaunch_core::ProcessControlError::CommandFailed {
            command: describe(program, args),
            reason: e.to_string(),
        })
}

fn describe(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
