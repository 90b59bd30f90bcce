//! `ps` listing and `SIGTERM` termination.

use async_trait::async_trait;
use devlaunch_core::{ProcessControlError, ProcessEntry, ProcessKiller, ProcessLister};
use tracing::{debug, warn};

use super::{describe, run_command};

/// Lists processes with `ps -eo pid=,args=` and sends `SIGTERM` to the
/// listed pids. The launcher's own pid is never listed, so never killed.
#[derive(Debug, Clone, Copy)]
pub struct PosixProcessControl {
    own_pid: u32,
}

impl PosixProcessControl {
    pub fn new() -> Self {
        Self {
            own_pid: std::process::id(),
        }
    }

    #[cfg(all(test, unix))]
    const fn with_own_pid(own_pid: u32) -> Self {
        Self { own_pid }
    }
}

impl Default for PosixProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLister for PosixProcessControl {
    async fn list_matching(&self, pattern: &str) -> Result<Vec<ProcessEntry>, ProcessControlError> {
        let args = ps_args();
        let output = run_command("ps", &args).await?;

        if !output.status.success() {
            return Err(ProcessControlError::CommandFailed {
                command: describe("ps", &args),
                reason: format!("exited with {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_ps_output(&stdout, pattern, self.own_pid);
        debug!(pattern, count = entries.len(), "Listed matching processes");
        Ok(entries)
    }
}

#[async_trait]
impl ProcessKiller for PosixProcessControl {
    async fn kill_matching(&self, pattern: &str) -> Result<(), ProcessControlError> {
        let entries = self.list_matching(pattern).await?;
        let pids = pids_to_terminate(&entries, self.own_pid);

        let mut first_error = None;
        for pid in pids {
            if let Err(e) = terminate(pid) {
                warn!(pid, error = %e, "Failed to terminate process");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

fn ps_args() -> Vec<String> {
    vec!["-eo".to_string(), "pid=,args=".to_string()]
}

/// Pids worth signalling: listed, known, and not this process.
fn pids_to_terminate(entries: &[ProcessEntry], own_pid: u32) -> Vec<u32> {
    entries
        .iter()
        .filter_map(|e| e.pid)
        .filter(|pid| *pid != own_pid)
        .collect()
}

#[cfg(unix)]
fn terminate(pid: u32) -> Result<(), ProcessControlError> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| ProcessControlError::CommandFailed {
        command: format!("kill -TERM {pid}"),
        reason: "pid out of range".to_string(),
    })?;
    debug!(pid, "Sending SIGTERM");
    signal_result(pid, signal::kill(Pid::from_raw(raw), Signal::SIGTERM))
}

#[cfg(not(unix))]
fn terminate(pid: u32) -> Result<(), ProcessControlError> {
    Err(ProcessControlError::Unsupported(format!(
        "signalling pid {pid} needs a Unix host"
    )))
}

/// A process that already exited (`ESRCH`) counts as terminated.
#[cfg(unix)]
fn signal_result(pid: u32, result: nix::Result<()>) -> Result<(), ProcessControlError> {
    match result {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ProcessControlError::CommandFailed {
            command: format!("kill -TERM {pid}"),
            reason: errno.desc().to_string(),
        }),
    }
}

/// Parse `ps -eo pid=,args=` output, keeping rows whose command line
/// contains `pattern` and dropping `own_pid`.
fn parse_ps_output(output: &str, pattern: &str, own_pid: u32) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, args) = line.trim().split_once(char::is_whitespace)?;
            let pid = pid.parse::<u32>().ok()?;
            Some((pid, args.trim()))
        })
        .filter(|(pid, args)| *pid != own_pid && args.contains(pattern))
        .map(|(pid, args)| ProcessEntry::new(Some(pid), args))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS_OUTPUT: &str = "    1 /sbin/init
  812 node /app/node_modules/.bin/next dev -p 3000
  813 /usr/bin/zsh
 4242 devlaunch dev --project-dir /srv/next-site
  900 node /srv/site/node_modules/next/dist/server/lib/start-server.js
";

    #[test]
    fn keeps_matching_rows_and_skips_own_pid() {
        let entries = parse_ps_output(PS_OUTPUT, "next", 4242);

        let pids: Vec<_> = entries.iter().filter_map(|e| e.pid).collect();
        assert_eq!(pids, vec![812, 900]);
        assert_eq!(entries[0].command, "node /app/node_modules/.bin/next dev -p 3000");
    }

    #[test]
    fn ignores_blank_and_malformed_lines() {
        let entries = parse_ps_output("\n  abc next\n   \n", "next", 1);
        assert!(entries.is_empty());
    }

    #[test]
    fn no_match_is_empty() {
        assert!(parse_ps_output(PS_OUTPUT, "vite", 1).is_empty());
    }

    #[test]
    fn ps_prints_pid_and_full_command_line_without_headers() {
        assert_eq!(ps_args(), vec!["-eo", "pid=,args="]);
    }

    #[test]
    fn own_pid_and_unknown_pids_are_never_signalled() {
        let entries = vec![
            ProcessEntry::new(Some(812), "next dev"),
            ProcessEntry::new(Some(4242), "devlaunch --pattern next"),
            ProcessEntry::new(None, "next (pid hidden)"),
            ProcessEntry::new(Some(900), "next start"),
        ];

        assert_eq!(pids_to_terminate(&entries, 4242), vec![812, 900]);
    }

    #[cfg(unix)]
    #[test]
    fn already_exited_counts_as_terminated() {
        use nix::errno::Errno;

        assert!(signal_result(812, Ok(())).is_ok());
        assert!(signal_result(812, Err(Errno::ESRCH)).is_ok());

        let err = signal_result(812, Err(Errno::EPERM)).unwrap_err();
        assert!(matches!(
            err,
            ProcessControlError::CommandFailed { ref command, .. } if command == "kill -TERM 812"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lists_without_matching_itself() {
        let control = PosixProcessControl::new();
        let own = std::process::id();

        // Minimal containers may lack procps
        let Ok(entries) = control.list_matching("devlaunch").await else {
            return;
        };
        assert!(entries.iter().all(|e| e.pid != Some(own)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_spares_own_pid_and_terminates_the_rest() {
        use std::os::unix::process::ExitStatusExt;
        use tokio::process::Command;

        // Unique to this test run, shared by both children
        let marker = format!("29.{}", std::process::id());
        let mut kept = Command::new("sleep")
            .arg(format!("{marker}1"))
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let mut victim = Command::new("sleep")
            .arg(format!("{marker}2"))
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        // `kept` plays the launcher: its command line matches too
        let control = PosixProcessControl::with_own_pid(kept.id().unwrap());
        if control.kill_matching(&marker).await.is_err() {
            // Minimal containers may lack procps
            let _ = kept.kill().await;
            let _ = victim.kill().await;
            return;
        }

        let status = victim.wait().await.unwrap();
        assert_eq!(status.signal(), Some(nix::sys::signal::Signal::SIGTERM as i32));
        assert!(kept.try_wait().unwrap().is_none());

        kept.kill().await.unwrap();
    }
}
