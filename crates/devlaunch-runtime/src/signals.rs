//! Shutdown signal handling for the launcher.

use std::io;

use devlaunch_core::ShutdownSignal;
use tokio::process::Child;
use tracing::{debug, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Resolve when the launcher receives SIGINT or SIGTERM (Ctrl+C on Windows).
///
/// If a listener cannot be installed the corresponding signal is never
/// reported; the other one still is.
pub async fn wait_for_shutdown_signal() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                None
            }
        };

        tokio::select! {
            () = ctrl_c() => ShutdownSignal::Interrupt,
            Some(()) = async {
                match sigterm.as_mut() {
                    Some(stream) => stream.recv().await,
                    None => std::future::pending().await,
                }
            } => ShutdownSignal::Terminate,
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        ShutdownSignal::Interrupt
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Send an interrupt to the child and return without waiting for it.
///
/// On Unix this is SIGINT so the server can shut down on its own terms.
/// Windows has no equivalent for a console child, so it is terminated.
/// A child that has already exited is not an error.
pub fn forward_interrupt(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        debug!("Child already reaped; nothing to interrupt");
        return Ok(());
    };

    #[cfg(unix)]
    {
        let raw = i32::try_from(pid).map_err(io::Error::other)?;
        match signal::kill(Pid::from_raw(raw), Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => {
                debug!(pid, "Forwarded SIGINT to dev server");
                Ok(())
            }
            Err(e) => Err(io::Error::other(e)),
        }
    }

    #[cfg(not(unix))]
    {
        debug!(pid, "Terminating dev server");
        child.start_kill()
    }
}
