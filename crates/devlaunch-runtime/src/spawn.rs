//! Building and spawning the dev server process.

use std::process::Stdio;

use devlaunch_core::{LaunchConfig, LaunchError};
use tokio::process::{Child, Command};
use tracing::debug;

/// Build the server command for `port`.
///
/// The port is appended as `<port_flag> <port>` and exported as `PORT`.
/// Stdio is inherited so the server writes straight to the terminal. With
/// `shell` set the whole command line goes through `cmd /C` or `sh -c`.
pub fn build_server_command(config: &LaunchConfig, port: u16) -> Command {
    let server = &config.server;

    let mut cmd = if server.shell {
        shell_command(&server.command_line(port))
    } else {
        let mut cmd = Command::new(&server.program);
        cmd.args(server.args_for(port));
        cmd
    };

    cmd.current_dir(&config.project_root)
        .env("PORT", port.to_string())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    cmd
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_line);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

/// Spawn the dev server on `port`.
///
/// # Errors
///
/// Returns [`LaunchError::Spawn`] when the OS cannot create the process. No
/// child handle exists in that case.
pub fn spawn_server(config: &LaunchConfig, port: u16) -> Result<Child, LaunchError> {
    let command_line = config.server.command_line(port);
    debug!(command = %command_line, cwd = %config.project_root.display(), "Spawning dev server");

    build_server_command(config, port)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            command: command_line,
            source,
        })
}
