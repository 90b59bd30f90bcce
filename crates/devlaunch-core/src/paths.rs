//! Path resolution for the project, its build output and the lock marker.
//!
//! Layout relative to the project root:
//!
//! ```text
//! devlaunch.json          optional settings file
//! .next/                  build output directory (configurable)
//! └── dev/                development build output, removed by `clean`
//!     └── lock            lock marker left by a running server
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default build output directory of the web framework.
pub const DEFAULT_BUILD_DIR: &str = ".next";

/// Name of the optional settings file in the project root.
pub const SETTINGS_FILE_NAME: &str = "devlaunch.json";

/// Errors that can occur while resolving paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// A path was expected to be a directory but was not.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// Failed to get the current working directory.
    #[error("Cannot determine current directory: {0}")]
    CurrentDirError(String),
}

/// Resolve the project root: an explicit directory if given, else the
/// current working directory.
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    let root = match explicit {
        Some(path) if path.as_os_str().is_empty() => return Err(PathError::EmptyPath),
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => current_dir()?.join(path),
        None => current_dir()?,
    };

    if !root.is_dir() {
        return Err(PathError::NotADirectory(root));
    }

    Ok(root)
}

fn current_dir() -> Result<PathBuf, PathError> {
    std::env::current_dir().map_err(|e| PathError::CurrentDirError(e.to_string()))
}

/// Build directory under `project_root`; absolute build dirs are kept as is.
pub fn resolve_build_dir(project_root: &Path, build_dir: &Path) -> PathBuf {
    if build_dir.is_absolute() {
        build_dir.to_path_buf()
    } else {
        project_root.join(build_dir)
    }
}

/// `<build-dir>/dev`
pub fn dev_dir_path(build_dir: &Path) -> PathBuf {
    build_dir.join("dev")
}

/// `<build-dir>/dev/lock`
pub fn lock_file_path(build_dir: &Path) -> PathBuf {
    dev_dir_path(build_dir).join("lock")
}

/// `<project-root>/devlaunch.json`
pub fn settings_file_path(project_root: &Path) -> PathBuf {
    project_root.join(SETTINGS_FILE_NAME)
}
