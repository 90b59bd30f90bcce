//! Reap dev servers left over from earlier runs.

use devlaunch_core::{
    LaunchEvent, LaunchEventEmitter, ProcessKiller, ProcessLister, ReapConfig,
};
use tracing::{debug, info, warn};

/// Result of a reap attempt. The launcher continues in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
    /// Nothing matched the pattern.
    NoneFound,
    /// Matching processes were found and a kill was issued.
    Reaped { count: usize },
    /// Listing or killing failed.
    Failed { reason: String },
}

/// List processes matching `config.pattern` and terminate them.
///
/// When anything matched, waits `config.grace_period` after the kill so the
/// OS can release their ports, even if the kill itself reported an error.
/// Never fails; problems are emitted as [`LaunchEvent::ReapFailed`].
pub async fn reap_existing(
    lister: &dyn ProcessLister,
    killer: &dyn ProcessKiller,
    config: &ReapConfig,
    events: &dyn LaunchEventEmitter,
) -> ReapOutcome {
    let matches = match lister.list_matching(&config.pattern).await {
        Ok(matches) => matches,
        Err(e) => {
            warn!(pattern = %config.pattern, error = %e, "Could not list processes");
            return failed(events, e.to_string());
        }
    };

    if matches.is_empty() {
        debug!(pattern = %config.pattern, "No leftover dev servers");
        return ReapOutcome::NoneFound;
    }

    let count = matches.len();
    events.emit(LaunchEvent::ExistingProcessesFound {
        pattern: config.pattern.clone(),
        count,
    });

    let kill_result = killer.kill_matching(&config.pattern).await;

    if !config.grace_period.is_zero() {
        tokio::time::sleep(config.grace_period).await;
    }

    match kill_result {
        Ok(()) => {
            info!(pattern = %config.pattern, count, "Terminated leftover dev servers");
            ReapOutcome::Reaped { count }
        }
        Err(e) => {
            warn!(pattern = %config.pattern, error = %e, "Could not terminate processes");
            failed(events, e.to_string())
        }
    }
}

fn failed(events: &dyn LaunchEventEmitter, reason: String) -> ReapOutcome {
    events.emit(LaunchEvent::ReapFailed {
        reason: reason.clone(),
    });
    ReapOutcome::Failed { reason }
}
