//! Best-effort removal of state left by a previous dev server run.

use std::io;
use std::path::{Path, PathBuf};

use devlaunch_core::{CleanupMode, LaunchEvent, LaunchEventEmitter, dev_dir_path, lock_file_path};
use tokio::fs;
use tracing::{debug, warn};

/// What the cleanup stage did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Paths that existed and were deleted.
    pub removed: Vec<PathBuf>,
    /// Paths that could not be deleted, with the reason.
    pub warnings: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Remove the lock marker, and with [`CleanupMode::FullDevDir`] the whole
/// development build directory, under `build_dir`.
///
/// Never fails: missing paths are skipped silently and every other error is
/// recorded as a warning and emitted as [`LaunchEvent::CleanupFailed`].
pub async fn cleanup_stale_state(
    build_dir: &Path,
    mode: CleanupMode,
    events: &dyn LaunchEventEmitter,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    let lock_path = lock_file_path(build_dir);
    match remove_if_present(&lock_path, false).await {
        Ok(true) => {
            events.emit(LaunchEvent::LockFileRemoved {
                path: lock_path.clone(),
            });
            report.removed.push(lock_path);
        }
        Ok(false) => debug!(path = %lock_path.display(), "No stale lock file"),
        Err(e) => record_failure(&mut report, events, lock_path, &e),
    }

    if mode == CleanupMode::FullDevDir {
        let dev_dir = dev_dir_path(build_dir);
        match remove_if_present(&dev_dir, true).await {
            Ok(true) => {
                events.emit(LaunchEvent::DevDirRemoved {
                    path: dev_dir.clone(),
                });
                report.removed.push(dev_dir);
            }
            Ok(false) => debug!(path = %dev_dir.display(), "No dev build directory"),
            Err(e) => record_failure(&mut report, events, dev_dir, &e),
        }
    }

    report
}

/// Delete `path`. `Ok(false)` when it did not exist.
async fn remove_if_present(path: &Path, recursive: bool) -> io::Result<bool> {
    let result = if recursive {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn record_failure(
    report: &mut CleanupReport,
    events: &dyn LaunchEventEmitter,
    path: PathBuf,
    error: &io::Error,
) {
    warn!(path = %path.display(), error = %error, "Could not clean up stale state");
    events.emit(LaunchEvent::CleanupFailed {
        path: path.clone(),
        reason: error.to_string(),
    });
    report.warnings.push((path, error.to_string()));
}
