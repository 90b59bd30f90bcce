//! Console rendering of launch events.
//!
//! Format-only: every status line comes from a [`LaunchEvent`]. Errors go
//! to stderr, everything else to stdout.

use std::io::Write;

use devlaunch_core::{LaunchEvent, LaunchEventEmitter, Preset};

/// Prints launch events as status lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEmitter;

impl ConsoleEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl LaunchEventEmitter for ConsoleEmitter {
    fn emit(&self, event: LaunchEvent) {
        let lines = render(&event);
        if lines.is_empty() {
            return;
        }

        // Write failures (closed pipe) must not stop the launcher
        if event.is_error() {
            let mut out = std::io::stderr().lock();
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
        } else {
            let mut out = std::io::stdout().lock();
            for line in lines {
                let _ = writeln!(out, "{line}");
            }
            let _ = out.flush();
        }
    }
}

/// Status lines for `event`. Empty when the event is not shown.
pub fn render(event: &LaunchEvent) -> Vec<String> {
    match event {
        LaunchEvent::Started { preset } => vec![intro(*preset).to_string()],
        LaunchEvent::LockFileRemoved { .. } => vec!["🧹 Cleaned up lock file".to_string()],
        LaunchEvent::DevDirRemoved { .. } => vec!["🧹 Cleaned up dev directory".to_string()],
        LaunchEvent::CleanupFailed { path, reason } => {
            vec![format!("⚠️  Could not remove {}: {reason}", path.display())]
        }
        LaunchEvent::ExistingProcessesFound { pattern, count } => vec![format!(
            "🔄 Found {count} existing '{pattern}' process{}, cleaning up...",
            if *count == 1 { "" } else { "es" }
        )],
        LaunchEvent::ReapFailed { reason } => {
            vec![format!("⚠️  Could not clean up existing processes: {reason}")]
        }
        LaunchEvent::BasePortBusy { base, next } => vec![format!(
            "⚠️  Port {base} is already in use, starting from {next}..."
        )],
        LaunchEvent::ServerStarting {
            selection,
            local_url,
            network_url,
            avoided_common_ports,
        } => {
            let mut lines = vec![
                format!(
                    "🚀 Starting development server on port {}...",
                    selection.port
                ),
                format!("📱 Local: {local_url}"),
                format!("🌐 Network: {network_url}"),
            ];
            if *avoided_common_ports {
                lines.push("💡 This port avoids common development conflicts".to_string());
            }
            lines
        }
        LaunchEvent::ServerSpawned { .. } => Vec::new(),
        LaunchEvent::SpawnFailed { reason, .. } => {
            vec![format!("❌ Failed to start development server: {reason}")]
        }
        LaunchEvent::ServerExited { code } => vec![match code {
            Some(code) => format!("❌ Development server exited with code {code}"),
            None => "❌ Development server was terminated by a signal".to_string(),
        }],
        LaunchEvent::ShuttingDown { .. } => {
            vec!["\n🛑 Shutting down development server...".to_string()]
        }
    }
}

const fn intro(preset: Preset) -> &'static str {
    match preset {
        Preset::Dev => "🔍 Checking for available port...",
        Preset::Clean => "🔍 Cleaning up and finding available port...",
        Preset::Simple => "🔍 Finding available port...",
        Preset::Smart => "🔍 Smart port detection (avoiding common dev ports)...",
    }
}

/// Line printed for a fatal launcher error.
pub fn render_fatal(error: &dyn std::fmt::Display) -> String {
    format!("❌ Error starting development server: {error}")
}
