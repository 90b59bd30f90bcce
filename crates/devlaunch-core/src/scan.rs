//! Port scan policies and the first-fit scanner.
//!
//! The scanner is pure: availability comes from an injected [`PortProbe`],
//! so the same code drives real sockets in the runtime and scripted probes
//! in tests. Candidates are always probed one at a time in ascending order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::events::{LaunchEvent, LaunchEventEmitter};
use crate::ports::PortProbe;

/// First port tried by the sequential policy.
pub const DEFAULT_BASE_PORT: u16 = 3000;

/// Number of consecutive ports the sequential policy will try.
pub const DEFAULT_SCAN_WINDOW: u16 = 100;

/// Ports commonly held by other local tooling.
pub const AVOID_PORTS: [u16; 11] = [3000, 3001, 3002, 3003, 3004, 3005, 8000, 8080, 5000, 4000, 9000];

/// Range scanned first by the avoid-list policy.
pub const PREFERRED_RANGE: PortRange = PortRange::new(3006, 3100);

/// Range scanned without exclusions once the preferred range is used up.
pub const FALLBACK_RANGE: PortRange = PortRange::new(3000, 3200);

/// Inclusive range of TCP ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    #[must_use]
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Whether the range contains at least one port.
    pub const fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub const fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Ports in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// How the scanner picks a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Probe `base..base + window` and take the first free port.
    Sequential { base: u16, window: u16 },
    /// Probe `preferred` skipping `avoid`, then fall back to all of `fallback`.
    AvoidList {
        avoid: BTreeSet<u16>,
        preferred: PortRange,
        fallback: PortRange,
    },
}

impl ScanPolicy {
    /// Sequential scan over the default window starting at `base`.
    #[must_use]
    pub const fn sequential(base: u16) -> Self {
        Self::Sequential {
            base,
            window: DEFAULT_SCAN_WINDOW,
        }
    }

    /// Avoid-list scan with the built-in avoid set and ranges.
    #[must_use]
    pub fn avoid_common_ports() -> Self {
        Self::AvoidList {
            avoid: AVOID_PORTS.into_iter().collect(),
            preferred: PREFERRED_RANGE,
            fallback: FALLBACK_RANGE,
        }
    }

    pub const fn uses_avoid_list(&self) -> bool {
        matches!(self, Self::AvoidList { .. })
    }

    fn validate(&self) -> Result<(), ScanError> {
        match self {
            Self::Sequential { window: 0, .. } => Err(ScanError::InvalidPolicy(
                "scan window must contain at least one port".to_string(),
            )),
            Self::Sequential { .. } => Ok(()),
            Self::AvoidList {
                preferred,
                fallback,
                ..
            } => {
                if !preferred.is_valid() {
                    return Err(ScanError::InvalidPolicy(format!(
                        "preferred range {preferred} is empty"
                    )));
                }
                if !fallback.is_valid() {
                    return Err(ScanError::InvalidPolicy(format!(
                        "fallback range {fallback} is empty"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Which part of a policy produced the chosen port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Sequential,
    Preferred,
    Fallback,
}

/// Result of a successful scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSelection {
    pub port: u16,
    pub source: SelectionSource,
    /// Number of ports probed, including the chosen one.
    pub probed: u32,
}

/// Errors produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("No available ports found in range {first}-{last} ({probed} probed)")]
    Exhausted { first: u16, last: u16, probed: u32 },

    #[error("Invalid scan policy: {0}")]
    InvalidPolicy(String),
}

/// Find the first available port allowed by `policy`.
///
/// Probes are awaited one after another so selection is deterministic for a
/// given set of occupied ports.
pub async fn find_available_port(
    policy: &ScanPolicy,
    probe: &dyn PortProbe,
    events: &dyn LaunchEventEmitter,
) -> Result<PortSelection, ScanError> {
    policy.validate()?;

    match policy {
        ScanPolicy::Sequential { base, window } => {
            scan_sequential(*base, *window, probe, events).await
        }
        ScanPolicy::AvoidList {
            avoid,
            preferred,
            fallback,
        } => scan_avoiding(avoid, *preferred, *fallback, probe).await,
    }
}

async fn scan_sequential(
    base: u16,
    window: u16,
    probe: &dyn PortProbe,
    events: &dyn LaunchEventEmitter,
) -> Result<PortSelection, ScanError> {
    let last = base.saturating_add(window - 1);
    let mut probed = 1;

    if probe.is_available(base).await {
        return Ok(PortSelection {
            port: base,
            source: SelectionSource::Sequential,
            probed,
        });
    }

    if let Some(next) = base.checked_add(1).filter(|next| *next <= last) {
        events.emit(LaunchEvent::BasePortBusy { base, next });

        for port in next..=last {
            probed += 1;
            if probe.is_available(port).await {
                debug!(port = %port, probed = %probed, "Selected port sequentially");
                return Ok(PortSelection {
                    port,
                    source: SelectionSource::Sequential,
                    probed,
                });
            }
            debug!(port = %port, "Port unavailable on system, skipping");
        }
    }

    Err(ScanError::Exhausted {
        first: base,
        last,
        probed,
    })
}

async fn scan_avoiding(
    avoid: &BTreeSet<u16>,
    preferred: PortRange,
    fallback: PortRange,
    probe: &dyn PortProbe,
) -> Result<PortSelection, ScanError> {
    let mut probed = 0;

    for port in preferred.iter().filter(|port| !avoid.contains(port)) {
        probed += 1;
        if probe.is_available(port).await {
            debug!(port = %port, probed = %probed, "Selected port from preferred range");
            return Ok(PortSelection {
                port,
                source: SelectionSource::Preferred,
                probed,
            });
        }
    }

    debug!(range = %preferred, "Preferred range exhausted, falling back");

    for port in fallback.iter() {
        probed += 1;
        if probe.is_available(port).await {
            debug!(port = %port, probed = %probed, "Selected port from fallback range");
            return Ok(PortSelection {
                port,
                source: SelectionSource::Fallback,
                probed,
            });
        }
    }

    Err(ScanError::Exhausted {
        first: fallback.start,
        last: fallback.end,
        probed,
    })
}
