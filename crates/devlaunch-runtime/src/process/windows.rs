//! `tasklist` / `taskkill` process control.
//!
//! Dev servers run as `node.exe`, so both commands are restricted to that
//! image. The pattern is matched against the window title in both cases.

use async_trait::async_trait;
use devlaunch_core::{ProcessControlError, ProcessEntry, ProcessKiller, ProcessLister};
use tracing::debug;

use super::{describe, run_command};

const NODE_IMAGE: &str = "node.exe";

/// Zero-based index of "Window Title" in `tasklist /V` CSV rows.
const WINDOW_TITLE_COLUMN: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsProcessControl;

impl WindowsProcessControl {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLister for WindowsProcessControl {
    async fn list_matching(&self, pattern: &str) -> Result<Vec<ProcessEntry>, ProcessControlError> {
        let args = tasklist_args();
        let output = run_command("tasklist", &args).await?;

        if !output.status.success() {
            return Err(ProcessControlError::CommandFailed {
                command: describe("tasklist", &args),
                reason: format!("exited with {}", output.status),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = parse_tasklist_csv(&stdout, pattern);
        debug!(pattern, count = entries.len(), "Listed matching node processes");
        Ok(entries)
    }
}

#[async_trait]
impl ProcessKiller for WindowsProcessControl {
    async fn kill_matching(&self, pattern: &str) -> Result<(), ProcessControlError> {
        let args = taskkill_args(pattern);
        let output = run_command("taskkill", &args).await?;

        taskkill_result(
            output.status.success(),
            &String::from_utf8_lossy(&output.stderr),
            &args,
        )
    }
}

fn tasklist_args() -> Vec<String> {
    vec![
        "/FI".to_string(),
        format!("IMAGENAME eq {NODE_IMAGE}"),
        "/FO".to_string(),
        "CSV".to_string(),
        "/V".to_string(),
    ]
}

fn taskkill_args(pattern: &str) -> Vec<String> {
    vec![
        "/F".to_string(),
        "/IM".to_string(),
        NODE_IMAGE.to_string(),
        "/FI".to_string(),
        format!("WINDOWTITLE eq *{pattern}*"),
    ]
}

fn taskkill_result(
    success: bool,
    stderr: &str,
    args: &[String],
) -> Result<(), ProcessControlError> {
    if success {
        Ok(())
    } else {
        Err(ProcessControlError::CommandFailed {
            command: describe("taskkill", args),
            reason: stderr.trim().to_string(),
        })
    }
}

/// Parse `tasklist /FO CSV /V` rows whose window title contains `pattern`.
///
/// The header row and `INFO:` lines are skipped because their PID column
/// does not parse.
fn parse_tasklist_csv(output: &str, pattern: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let fields = split_csv_row(line);
            let pid = fields.get(1)?.parse::<u32>().ok()?;
            let title = fields.get(WINDOW_TITLE_COLUMN)?;
            title
                .contains(pattern)
                .then(|| ProcessEntry::new(Some(pid), line))
        })
        .collect()
}

/// Split a fully quoted CSV row. `tasklist` quotes every field.
fn split_csv_row(line: &str) -> Vec<&str> {
    line.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(|inner| inner.split("\",\"").collect())
        .unwrap_or_default()
}
