//! The launch pipeline: cleanup, reap, scan, spawn, supervise.

use std::future::Future;
use std::process::ExitStatus;
use std::sync::Arc;

use devlaunch_core::{
    LaunchConfig, LaunchError, LaunchEvent, LaunchEventEmitter, LaunchOutcome, LauncherState,
    LifecycleEvent, PortProbe, ProcessKiller, ProcessLister, ShutdownSignal, find_available_port,
};
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::cleanup::cleanup_stale_state;
use crate::network::{local_url, network_url};
use crate::probe::TcpPortProbe;
use crate::process::{platform_process_control, reap_existing};
use crate::signals::{forward_interrupt, wait_for_shutdown_signal};
use crate::spawn::spawn_server;

/// Runs one launch from cleanup to child exit.
///
/// OS access goes through the core ports so each stage can be replaced in
/// tests. [`Launcher::new`] wires the real implementations.
pub struct Launcher {
    config: LaunchConfig,
    probe: Arc<dyn PortProbe>,
    lister: Arc<dyn ProcessLister>,
    killer: Arc<dyn ProcessKiller>,
    events: Arc<dyn LaunchEventEmitter>,
}

impl Launcher {
    /// Launcher using TCP probing and the platform's process control.
    pub fn new(config: LaunchConfig, events: Arc<dyn LaunchEventEmitter>) -> Self {
        let control = platform_process_control();
        Self {
            config,
            probe: Arc::new(TcpPortProbe::new()),
            lister: control.clone(),
            killer: control,
            events,
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn PortProbe>) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn with_process_control(
        mut self,
        lister: Arc<dyn ProcessLister>,
        killer: Arc<dyn ProcessKiller>,
    ) -> Self {
        self.lister = lister;
        self.killer = killer;
        self
    }

    pub const fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Launch and supervise until the server exits or the launcher receives
    /// SIGINT/SIGTERM.
    pub async fn run(&self) -> Result<LaunchOutcome, LaunchError> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Launch and supervise until the server exits or `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Fails when no port is free, the server cannot be spawned, or waiting
    /// on it fails. Cleanup and reap problems are only reported as events.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<LaunchOutcome, LaunchError>
    where
        F: Future<Output = ShutdownSignal>,
    {
        let config = &self.config;
        let events = self.events.as_ref();

        events.emit(LaunchEvent::Started {
            preset: config.preset,
        });

        cleanup_stale_state(&config.build_dir_path(), config.cleanup, events).await;

        if config.kill_existing {
            reap_existing(
                self.lister.as_ref(),
                self.killer.as_ref(),
                &config.reap,
                events,
            )
            .await;
        }

        let selection = find_available_port(&config.scan, self.probe.as_ref(), events).await?;
        let port = selection.port;
        info!(port, source = ?selection.source, probed = selection.probed, "Selected port");

        events.emit(LaunchEvent::ServerStarting {
            selection,
            local_url: local_url(port),
            network_url: network_url(port, config.network_host.as_deref()),
            avoided_common_ports: config.scan.uses_avoid_list(),
        });

        // The port is not re-probed here; another process may take it first.
        let child = match spawn_server(config, port) {
            Ok(child) => child,
            Err(e) => {
                let state = LauncherState::Idle.transition(LifecycleEvent::SpawnFailed)?;
                debug!(?state, "Spawn failed");
                events.emit(LaunchEvent::SpawnFailed {
                    command: config.server.command_line(port),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        events.emit(LaunchEvent::ServerSpawned { pid: child.id() });
        supervise(child, shutdown, events).await
    }
}

/// Wait for `child` to exit or `shutdown` to resolve, whichever is first.
///
/// On shutdown, SIGINT is forwarded to the child and the launcher returns
/// without waiting for it to exit.
pub async fn supervise<F>(
    mut child: Child,
    shutdown: F,
    events: &dyn LaunchEventEmitter,
) -> Result<LaunchOutcome, LaunchError>
where
    F: Future<Output = ShutdownSignal>,
{
    let state = LauncherState::Idle.transition(LifecycleEvent::Spawned { pid: child.id() })?;

    tokio::select! {
        status = child.wait() => {
            let outcome = outcome_from_status(status.map_err(LaunchError::Wait)?);
            let code = outcome.exit_code();
            let state = state.transition(LifecycleEvent::ChildExited { code })?;
            debug!(?state, ?outcome, "Dev server exited");

            if code != 0 {
                events.emit(LaunchEvent::ServerExited {
                    code: match outcome {
                        LaunchOutcome::ChildExited { code } => Some(code),
                        _ => None,
                    },
                });
            }
            Ok(outcome)
        }
        signal = shutdown => {
            let state = state.transition(LifecycleEvent::ShutdownRequested)?;
            events.emit(LaunchEvent::ShuttingDown { signal });

            if let Err(e) = forward_interrupt(&mut child) {
                warn!(error = %e, "Could not forward interrupt to dev server");
            }

            let state = state.transition(LifecycleEvent::Detached)?;
            debug!(?state, %signal, "Detached from dev server");
            Ok(LaunchOutcome::Interrupted { signal })
        }
    }
}

fn outcome_from_status(status: ExitStatus) -> LaunchOutcome {
    if let Some(code) = status.code() {
        return LaunchOutcome::ChildExited { code };
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        LaunchOutcome::ChildSignaled {
            signal: status.signal(),
        }
    }

    #[cfg(not(unix))]
    {
        LaunchOutcome::ChildSignaled { signal: None }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use devlaunch_core::{
        CleanupMode, Preset, ProcessControlError, ProcessEntry, ScanPolicy, ServerCommand,
        lock_file_path,
    };
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FreeProbe;

    #[async_trait]
    impl PortProbe for FreeProbe {
        async fn is_available(&self, _port: u16) -> bool {
            true
        }
    }

    struct BusyProbe;

    #[async_trait]
    impl PortProbe for BusyProbe {
        async fn is_available(&self, _port: u16) -> bool {
            false
        }
    }

    /// Reports one leftover server and counts kill requests.
    #[derive(Default)]
    struct FakeControl {
        kills: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcessLister for FakeControl {
        async fn list_matching(
            &self,
            pattern: &str,
        ) -> Result<Vec<ProcessEntry>, ProcessControlError> {
            Ok(vec![ProcessEntry::new(Some(99), format!("node {pattern} dev"))])
        }
    }

    #[async_trait]
    impl ProcessKiller for FakeControl {
        async fn kill_matching(&self, pattern: &str) -> Result<(), ProcessControlError> {
            self.kills.lock().unwrap().push(pattern.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEmitter(Mutex<Vec<LaunchEvent>>);

    impl LaunchEventEmitter for RecordingEmitter {
        fn emit(&self, event: LaunchEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl RecordingEmitter {
        fn events(&self) -> Vec<LaunchEvent> {
            self.0.lock().unwrap().clone()
        }

        /// Kill the detached server so it does not outlive the test.
        fn kill_spawned(&self) {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            for event in self.events() {
                if let LaunchEvent::ServerSpawned { pid: Some(pid) } = event {
                    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
                }
            }
        }
    }

    /// `sh -c <script>`; the appended `-p <port>` become `$0` and `$1`.
    fn shell_server(script: &str) -> ServerCommand {
        ServerCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            port_flag: "-p".to_string(),
            shell: false,
        }
    }

    fn launcher(
        config: LaunchConfig,
        control: Arc<FakeControl>,
        events: Arc<RecordingEmitter>,
    ) -> Launcher {
        Launcher::new(config, events)
            .with_probe(Arc::new(FreeProbe))
            .with_process_control(control.clone(), control)
    }

    fn simple_config(root: &TempDir, script: &str) -> LaunchConfig {
        LaunchConfig::from_preset(Preset::Simple, root.path()).with_server(shell_server(script))
    }

    #[tokio::test]
    async fn child_exit_code_is_propagated() {
        let root = TempDir::new().unwrap();
        let events = Arc::new(RecordingEmitter::default());
        let launcher = launcher(
            simple_config(&root, "exit 7"),
            Arc::new(FakeControl::default()),
            events.clone(),
        );

        let outcome = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert_eq!(outcome, LaunchOutcome::ChildExited { code: 7 });
        assert_eq!(outcome.exit_code(), 7);
        assert_eq!(
            events.events().last(),
            Some(&LaunchEvent::ServerExited { code: Some(7) })
        );
    }

    #[tokio::test]
    async fn clean_exit_is_zero_without_exit_event() {
        let root = TempDir::new().unwrap();
        let events = Arc::new(RecordingEmitter::default());
        let launcher = launcher(
            simple_config(&root, "exit 0"),
            Arc::new(FakeControl::default()),
            events.clone(),
        );

        let outcome = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert_eq!(outcome.exit_code(), 0);
        assert!(
            !events
                .events()
                .iter()
                .any(|e| matches!(e, LaunchEvent::ServerExited { .. }))
        );
    }

    #[tokio::test]
    async fn port_reaches_child_as_flag_and_env() {
        let root = TempDir::new().unwrap();
        let config = simple_config(&root, r#"[ "$0" = "-p" ] && [ "$1" = "$PORT" ] && [ "$PORT" = 3000 ]"#);
        let launcher = launcher(
            config,
            Arc::new(FakeControl::default()),
            Arc::new(RecordingEmitter::default()),
        );

        let outcome = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert_eq!(outcome, LaunchOutcome::ChildExited { code: 0 });
    }

    #[tokio::test]
    async fn child_runs_in_project_root() {
        let root = TempDir::new().unwrap();
        let config = simple_config(&root, "touch started-here");
        let launcher = launcher(
            config,
            Arc::new(FakeControl::default()),
            Arc::new(RecordingEmitter::default()),
        );

        launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert!(root.path().join("started-here").exists());
    }

    #[tokio::test]
    async fn unspawnable_command_exits_one() {
        let root = TempDir::new().unwrap();
        let events = Arc::new(RecordingEmitter::default());
        let config = LaunchConfig::from_preset(Preset::Simple, root.path()).with_server(
            ServerCommand {
                program: "devlaunch-no-such-program".to_string(),
                args: vec![],
                port_flag: "-p".to_string(),
                shell: false,
            },
        );
        let launcher = launcher(config, Arc::new(FakeControl::default()), events.clone());

        let err = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(matches!(
            events.events().last(),
            Some(LaunchEvent::SpawnFailed { .. })
        ));
        assert!(
            !events
                .events()
                .iter()
                .any(|e| matches!(e, LaunchEvent::ServerSpawned { .. }))
        );
    }

    #[tokio::test]
    async fn shutdown_forwards_interrupt_and_exits_zero() {
        let root = TempDir::new().unwrap();
        let events = Arc::new(RecordingEmitter::default());
        let launcher = launcher(
            simple_config(&root, "exec sleep 30"),
            Arc::new(FakeControl::default()),
            events.clone(),
        );

        let outcome = launcher
            .run_until(async { ShutdownSignal::Terminate })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            LaunchOutcome::Interrupted {
                signal: ShutdownSignal::Terminate
            }
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            events.events().last(),
            Some(&LaunchEvent::ShuttingDown {
                signal: ShutdownSignal::Terminate
            })
        );

        events.kill_spawned();
    }

    #[tokio::test]
    async fn exhausted_scan_spawns_nothing() {
        let root = TempDir::new().unwrap();
        let events = Arc::new(RecordingEmitter::default());
        let config = simple_config(&root, "touch spawned")
            .with_scan(ScanPolicy::Sequential {
                base: 3000,
                window: 5,
            });
        let launcher = launcher(config, Arc::new(FakeControl::default()), events.clone())
            .with_probe(Arc::new(BusyProbe));

        let err = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::Scan(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(!root.path().join("spawned").exists());
    }

    #[tokio::test]
    async fn dev_preset_cleans_and_reaps_before_spawning() {
        let root = TempDir::new().unwrap();
        let lock = lock_file_path(&root.path().join(".next"));
        std::fs::create_dir_all(lock.parent().unwrap()).unwrap();
        std::fs::write(&lock, "").unwrap();

        let control = Arc::new(FakeControl::default());
        let events = Arc::new(RecordingEmitter::default());
        let mut config = LaunchConfig::from_preset(Preset::Dev, root.path())
            .with_server(shell_server("exit 0"));
        config.reap.grace_period = std::time::Duration::ZERO;
        let launcher = launcher(config, control.clone(), events.clone());

        launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert!(!lock.exists());
        assert_eq!(*control.kills.lock().unwrap(), vec!["next"]);

        let events = events.events();
        assert!(matches!(events[0], LaunchEvent::Started { preset: Preset::Dev }));
        assert!(matches!(events[1], LaunchEvent::LockFileRemoved { .. }));
        assert!(matches!(
            events[2],
            LaunchEvent::ExistingProcessesFound { count: 1, .. }
        ));
        assert!(matches!(events[3], LaunchEvent::ServerStarting { .. }));
        assert!(matches!(events[4], LaunchEvent::ServerSpawned { .. }));
    }

    #[tokio::test]
    async fn simple_preset_never_reaps() {
        let root = TempDir::new().unwrap();
        let control = Arc::new(FakeControl::default());
        let launcher = launcher(
            simple_config(&root, "exit 0")
                .with_cleanup(CleanupMode::FullDevDir),
            control.clone(),
            Arc::new(RecordingEmitter::default()),
        );

        launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert!(control.kills.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signal_killed_child_maps_to_128_plus_signo() {
        let root = TempDir::new().unwrap();
        let launcher = launcher(
            simple_config(&root, "kill -TERM $$"),
            Arc::new(FakeControl::default()),
            Arc::new(RecordingEmitter::default()),
        );

        let outcome = launcher
            .run_until(std::future::pending::<ShutdownSignal>())
            .await
            .unwrap();

        assert_eq!(outcome, LaunchOutcome::ChildSignaled { signal: Some(15) });
        assert_eq!(outcome.exit_code(), 143);
    }
}
