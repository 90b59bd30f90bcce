//! Optional per-project settings file (`devlaunch.json`).
//!
//! All fields are optional; anything absent keeps the preset's value.
//! Settings are applied on top of a preset and below command-line flags.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{CleanupMode, LaunchConfig, ServerCommand};
use crate::scan::{PortRange, ScanPolicy};

/// Largest sequential scan window accepted from settings.
pub const MAX_SCAN_WINDOW: u16 = 1000;

/// Contents of `devlaunch.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchSettings {
    /// First port of the sequential scan.
    pub base_port: Option<u16>,

    /// Number of ports the sequential scan tries.
    pub scan_window: Option<u16>,

    /// Ports skipped by the avoid-list scan's preferred range.
    pub avoid_ports: Option<Vec<u16>>,

    /// Range scanned first by the avoid-list scan.
    pub preferred_range: Option<PortRange>,

    /// Range scanned once the preferred range is exhausted.
    pub fallback_range: Option<PortRange>,

    /// Build output directory (default `.next`).
    pub build_dir: Option<String>,

    /// Cleanup mode override.
    pub cleanup: Option<CleanupMode>,

    /// Command-line pattern for reaping leftover servers.
    pub process_pattern: Option<String>,

    /// Pause after reaping, in milliseconds.
    pub grace_period_ms: Option<u64>,

    /// Server command as argv, e.g. `["npx", "next", "dev"]`.
    pub command: Option<Vec<String>>,

    /// Flag placed before the port number (default `-p`).
    pub port_flag: Option<String>,

    /// Run the server through the platform shell.
    pub shell: Option<bool>,

    /// Host shown in the network URL.
    pub network_host: Option<String>,
}

/// Settings validation and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Scan window must be between 1 and 1000, got {0}")]
    InvalidScanWindow(u16),

    #[error("Port range {0} is empty")]
    InvalidRange(PortRange),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Validate settings values.
pub fn validate_settings(settings: &LaunchSettings) -> Result<(), SettingsError> {
    if let Some(port) = settings.base_port {
        if port < 1024 {
            return Err(SettingsError::InvalidPort(port));
        }
    }

    if let Some(window) = settings.scan_window {
        if !(1..=MAX_SCAN_WINDOW).contains(&window) {
            return Err(SettingsError::InvalidScanWindow(window));
        }
    }

    for range in [settings.preferred_range, settings.fallback_range]
        .into_iter()
        .flatten()
    {
        if !range.is_valid() {
            return Err(SettingsError::InvalidRange(range));
        }
        if range.start < 1024 {
            return Err(SettingsError::InvalidPort(range.start));
        }
    }

    if settings.command.as_ref().is_some_and(|argv| {
        argv.first().is_none_or(|program| program.trim().is_empty())
    }) {
        return Err(SettingsError::Empty("command"));
    }

    let blank = |value: &Option<String>| value.as_ref().is_some_and(|v| v.trim().is_empty());
    if blank(&settings.build_dir) {
        return Err(SettingsError::Empty("build_dir"));
    }
    if blank(&settings.process_pattern) {
        return Err(SettingsError::Empty("process_pattern"));
    }
    if blank(&settings.port_flag) {
        return Err(SettingsError::Empty("port_flag"));
    }

    Ok(())
}

/// Read and validate settings from `path`.
///
/// A missing file is not an error and yields `Ok(None)`.
pub fn load_settings(path: &Path) -> Result<Option<LaunchSettings>, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let settings: LaunchSettings =
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    validate_settings(&settings)?;
    Ok(Some(settings))
}

impl LaunchSettings {
    /// Overlay these settings onto `config`.
    pub fn apply_to(&self, mut config: LaunchConfig) -> LaunchConfig {
        match &mut config.scan {
            ScanPolicy::Sequential { base, window } => {
                if let Some(port) = self.base_port {
                    *base = port;
                }
                if let Some(size) = self.scan_window {
                    *window = size;
                }
            }
            ScanPolicy::AvoidList {
                avoid,
                preferred,
                fallback,
            } => {
                if let Some(ports) = &self.avoid_ports {
                    *avoid = ports.iter().copied().collect::<BTreeSet<_>>();
                }
                if let Some(range) = self.preferred_range {
                    *preferred = range;
                }
                if let Some(range) = self.fallback_range {
                    *fallback = range;
                }
            }
        }

        if let Some(dir) = &self.build_dir {
            config.build_dir = PathBuf::from(dir);
        }
        if let Some(cleanup) = self.cleanup {
            config.cleanup = cleanup;
        }
        if let Some(pattern) = &self.process_pattern {
            config.reap.pattern.clone_from(pattern);
        }
        if let Some(ms) = self.grace_period_ms {
            config.reap.grace_period = Duration::from_millis(ms);
        }
        if let Some(server) = self.command.as_deref().and_then(ServerCommand::from_argv) {
            config.server = server;
        }
        if let Some(flag) = &self.port_flag {
            config.server.port_flag.clone_from(flag);
        }
        if let Some(shell) = self.shell {
            config.server.shell = shell;
        }
        if let Some(host) = &self.network_host {
            config.network_host = Some(host.clone());
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;

    #[test]
    fn test_empty_settings_are_valid_and_inert() {
        let settings = LaunchSettings::default();
        assert!(validate_settings(&settings).is_ok());

        let config = LaunchConfig::from_preset(Preset::Dev, "/app");
        assert_eq!(settings.apply_to(config.clone()), config);
    }

    #[test]
    fn test_validate_port_too_low() {
        let settings = LaunchSettings {
            base_port: Some(80),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidPort(80))
        ));
    }

    #[test]
    fn test_validate_scan_window() {
        for window in [0, 5000] {
            let settings = LaunchSettings {
                scan_window: Some(window),
                ..Default::default()
            };
            assert!(matches!(
                validate_settings(&settings),
                Err(SettingsError::InvalidScanWindow(w)) if w == window
            ));
        }
    }

    #[test]
    fn test_validate_inverted_range() {
        let settings = LaunchSettings {
            preferred_range: Some(PortRange::new(4000, 3000)),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_validate_empty_command_and_strings() {
        let settings = LaunchSettings {
            command: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Empty("command"))
        ));

        let settings = LaunchSettings {
            process_pattern: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::Empty("process_pattern"))
        ));
    }

    #[test]
    fn test_apply_sequential_overrides() {
        let settings = LaunchSettings {
            base_port: Some(4000),
            scan_window: Some(20),
            build_dir: Some("build".to_string()),
            process_pattern: Some("vite".to_string()),
            grace_period_ms: Some(250),
            command: Some(vec!["pnpm".to_string(), "dev".to_string()]),
            port_flag: Some("--port".to_string()),
            network_host: Some("10.0.0.5".to_string()),
            ..Default::default()
        };

        let config = settings.apply_to(LaunchConfig::from_preset(Preset::Dev, "/app"));

        assert_eq!(
            config.scan,
            ScanPolicy::Sequential {
                base: 4000,
                window: 20
            }
        );
        assert_eq!(config.build_dir, PathBuf::from("build"));
        assert_eq!(config.reap.pattern, "vite");
        assert_eq!(config.reap.grace_period, Duration::from_millis(250));
        assert_eq!(config.server.program, "pnpm");
        assert_eq!(config.server.args_for(3000), vec!["dev", "--port", "3000"]);
        assert_eq!(config.network_host.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn test_apply_avoid_list_overrides_leave_base_port_alone() {
        let settings = LaunchSettings {
            base_port: Some(4000),
            avoid_ports: Some(vec![3006]),
            preferred_range: Some(PortRange::new(3006, 3010)),
            ..Default::default()
        };

        let config = settings.apply_to(LaunchConfig::from_preset(Preset::Smart, "/app"));

        match config.scan {
            ScanPolicy::AvoidList {
                avoid, preferred, ..
            } => {
                assert_eq!(avoid.into_iter().collect::<Vec<_>>(), vec![3006]);
                assert_eq!(preferred, PortRange::new(3006, 3010));
            }
            ScanPolicy::Sequential { .. } => panic!("policy kind must not change"),
        }
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings(&dir.path().join("devlaunch.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_parses_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devlaunch.json");
        fs::write(
            &path,
            r#"{ "base_port": 3100, "cleanup": "full-dev-dir", "preferred_range": { "start": 3200, "end": 3300 } }"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap().unwrap();
        assert_eq!(settings.base_port, Some(3100));
        assert_eq!(settings.cleanup, Some(CleanupMode::FullDevDir));
        assert_eq!(settings.preferred_range, Some(PortRange::new(3200, 3300)));
        assert_eq!(settings.scan_window, None);
    }

    #[test]
    fn test_load_rejects_unknown_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devlaunch.json");

        fs::write(&path, r#"{ "base_prot": 3100 }"#).unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SettingsError::Parse { .. })
        ));

        fs::write(&path, r#"{ "base_port": 22 }"#).unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SettingsError::InvalidPort(22))
        ));
    }
}
