//! # ProcessSupervisor: at most one supervised dev process per playground.
//!
//! The supervisor owns a single ownership table `PlaygroundId → Slot`. A slot
//! holds the run's command, pid, log buffer, liveness and last exit. Nothing
//! outside the table holds the child: the [`pump`](super::runner::pump) task
//! owns it, and every other component looks runs up by identifier.
//!
//! ## Architecture
//! ```text
//! start(id, cwd, cmd)
//!   ├─► lock table ─┬─ slot live? ──► StartOutcome { started: false, existing pid/cmd }
//!   │               └─ spawn `sh -c cmd` (own process group) ──► insert Slot{run=N, live}
//!   │                  publish DevStarted
//!   └─► tokio::spawn(watch(run N))
//!           └─► inner task: pump(Run) ──► DevLog… ──► ExitInfo
//!           └─► finish(id, N, latch, exit)
//!                  ├─ latch already fired? ──► ignore (duplicate notification)
//!                  ├─ slot.run == N ──► live = false, exit recorded
//!                  └─ publish DevExit, release exit waiters
//!
//! stop(id) ──► signal process group ──► (optional) escalation task:
//!              sleep(grace) ──► still the same live run? ──► SIGKILL
//! ```
//!
//! ## Rules
//! - The table lock is held across check-and-spawn: concurrent `start`s for one
//!   id never produce two children.
//! - A failed spawn leaves no slot behind.
//! - `DevExit` is published under the table lock, so a replacement run's
//!   `DevStarted` can never overtake the previous run's `DevExit`.
//! - Each run has an [`ExitLatch`]: exactly one `DevExit` per run.
//! - A program that does not resolve on `PATH` fails `start` before anything
//!   is spawned.
//! - `discard` never drops a slot whose process ignored the policy's stop: it
//!   escalates to SIGKILL first.
//! - Log buffers outlive their process; they are replaced by the next run or
//!   dropped by [`ProcessSupervisor::discard`].

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::log_buffer::LogRingBuffer;
use super::runner::{self, OutputStream, Run};
use crate::error::PlaygroundError;
use crate::events::{Bus, Event, ExitInfo};
use crate::policies::{StopSignal, TerminationPolicy};
use crate::registry::PlaygroundId;
use crate::shell;

/// Result of a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    /// False when a process was already live; nothing was spawned.
    pub started: bool,
    /// Pid of the live process (new or existing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Command of the live process (new or existing).
    pub command: String,
}

/// Liveness plus retained output of a playground's dev process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevStatus {
    pub running: bool,
    pub log: String,
    /// How the most recent run ended, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_exit: Option<ExitInfo>,
}

/// Fires once per run.
#[derive(Debug, Default)]
pub(crate) struct ExitLatch {
    fired: AtomicBool,
    done: CancellationToken,
}

impl ExitLatch {
    /// Returns true for the first call only.
    fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    async fn wait(&self) {
        self.done.cancelled().await;
    }

    fn has_exited(&self) -> bool {
        self.done.is_cancelled()
    }
}

/// One entry of the ownership table.
struct Slot {
    run: u64,
    pid: u32,
    command: Arc<str>,
    log: Arc<StdMutex<LogRingBuffer>>,
    live: bool,
    exit: Option<ExitInfo>,
    latch: Arc<ExitLatch>,
    kill: CancellationToken,
}

/// Supervises dev processes, one per playground identifier.
pub struct ProcessSupervisor {
    slots: Mutex<HashMap<PlaygroundId, Slot>>,
    bus: Bus,
    next_run: AtomicU64,
    log_capacity: usize,
    termination: TerminationPolicy,
    drain_timeout: Duration,
}

impl ProcessSupervisor {
    /// Creates a supervisor publishing to `bus`.
    pub fn new(
        bus: Bus,
        log_capacity: usize,
        termination: TerminationPolicy,
        drain_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(HashMap::new()),
            bus,
            next_run: AtomicU64::new(1),
            log_capacity: log_capacity.max(1),
            termination,
            drain_timeout,
        })
    }

    /// Starts `command` in `cwd` unless a process is already live for `id`.
    ///
    /// Returns once the process is launched (or immediately if already live).
    pub async fn start(
        self: &Arc<Self>,
        id: &PlaygroundId,
        cwd: &Path,
        command: &str,
    ) -> Result<StartOutcome, PlaygroundError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(PlaygroundError::NoCommand { id: id.clone() });
        }

        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(id).filter(|s| s.live) {
            debug!(playground = %id, pid = slot.pid, "dev process already running");
            return Ok(StartOutcome {
                started: false,
                pid: Some(slot.pid),
                command: slot.command.to_string(),
            });
        }

        let spawn_err = |source: std::io::Error| PlaygroundError::Spawn {
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
            source,
        };
        if !cwd.is_dir() {
            return Err(spawn_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "working directory does not exist",
            )));
        }

        #[cfg(unix)]
        if let Some(program) = shell::unresolved_program(command, cwd) {
            return Err(spawn_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("command not found: {program}"),
            )));
        }

        let mut cmd = shell::shell_command(command);
        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(spawn_err)?;
        let Some(pid) = child.id() else {
            return Err(spawn_err(std::io::Error::other("process exited before it could be tracked")));
        };
        let stdout = child.stdout.take().map(|s| Box::new(s) as OutputStream);
        let stderr = child.stderr.take().map(|s| Box::new(s) as OutputStream);

        Ok(self.adopt(&mut slots, id, pid, child, stdout, stderr, command))
    }

    /// Registers a freshly spawned child as the live run of `id` and hands it
    /// to its pump. The caller holds the table lock.
    #[allow(clippy::too_many_arguments)]
    fn adopt(
        self: &Arc<Self>,
        slots: &mut HashMap<PlaygroundId, Slot>,
        id: &PlaygroundId,
        pid: u32,
        child: Child,
        stdout: Option<OutputStream>,
        stderr: Option<OutputStream>,
        command: &str,
    ) -> StartOutcome {
        let run_no = self.next_run.fetch_add(1, Ordering::Relaxed);
        let command: Arc<str> = Arc::from(command);
        let log = Arc::new(StdMutex::new(LogRingBuffer::new(self.log_capacity)));
        let latch = Arc::new(ExitLatch::default());
        let kill = CancellationToken::new();

        slots.insert(
            id.clone(),
            Slot {
                run: run_no,
                pid,
                command: Arc::clone(&command),
                log: Arc::clone(&log),
                live: true,
                exit: None,
                latch: Arc::clone(&latch),
                kill: kill.clone(),
            },
        );
        self.bus
            .publish(Event::dev_started(id.clone(), pid, Arc::clone(&command)));
        info!(playground = %id, pid, command = %command, "dev process started");

        let run = Run {
            id: id.clone(),
            child,
            stdout,
            stderr,
            log,
            bus: self.bus.clone(),
            drain_timeout: self.drain_timeout,
            kill,
        };
        let me = Arc::clone(self);
        let id = id.clone();
        tokio::spawn(async move {
            let exit = match tokio::spawn(runner::pump(run)).await {
                Ok(exit) => exit,
                Err(e) => {
                    warn!(playground = %id, error = %e, "output pump died");
                    ExitInfo::abnormal("output pump panicked")
                }
            };
            me.finish(&id, run_no, &latch, exit).await;
        });

        StartOutcome {
            started: true,
            pid: Some(pid),
            command: command.to_string(),
        }
    }

    /// Records a run's exit and publishes `DevExit`, at most once per run.
    pub(crate) async fn finish(
        &self,
        id: &PlaygroundId,
        run_no: u64,
        latch: &ExitLatch,
        exit: ExitInfo,
    ) {
        let mut slots = self.slots.lock().await;
        if !latch.fire() {
            debug!(playground = %id, run = run_no, "duplicate exit notification ignored");
            return;
        }
        if let Some(slot) = slots.get_mut(id).filter(|s| s.run == run_no) {
            slot.live = false;
            slot.exit = Some(exit.clone());
        }
        self.bus.publish(Event::dev_exit(id.clone(), &exit));
        latch.done.cancel();
        drop(slots);

        info!(
            playground = %id,
            code = ?exit.code,
            signal = exit.signal.as_deref().unwrap_or("-"),
            "dev process exited"
        );
    }

    /// Requests termination of the live process for `id`.
    ///
    /// No-op when nothing is running. Returns once the signal is delivered;
    /// the exit event follows asynchronously.
    pub async fn stop(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let (pid, latch, kill) = {
            let slots = self.slots.lock().await;
            match slots.get(id).filter(|s| s.live) {
                Some(s) => (s.pid, Arc::clone(&s.latch), s.kill.clone()),
                None => return Ok(()),
            }
        };

        deliver(pid, self.termination.initial_signal(), &kill)?;
        debug!(playground = %id, pid, policy = ?self.termination, "stop signal delivered");

        if let Some(grace) = self.termination.escalate_after() {
            let id = id.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = latch.wait() => {}
                    _ = tokio::time::sleep(grace) => {
                        if !latch.has_exited() {
                            warn!(playground = %id, pid, ?grace, "process ignored SIGTERM; killing");
                            if let Err(e) = deliver(pid, StopSignal::Kill, &kill) {
                                warn!(playground = %id, error = %e, "forced kill failed");
                            }
                        }
                    }
                }
            });
        }
        Ok(())
    }

    /// Current liveness and retained log. Unknown ids report an empty, stopped status.
    pub async fn status(&self, id: &PlaygroundId) -> DevStatus {
        let slots = self.slots.lock().await;
        match slots.get(id) {
            Some(slot) => DevStatus {
                running: slot.live,
                log: slot
                    .log
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .snapshot(),
                last_exit: slot.exit.clone(),
            },
            None => DevStatus::default(),
        }
    }

    /// True if a process is live for `id`.
    pub async fn is_running(&self, id: &PlaygroundId) -> bool {
        self.slots
            .lock()
            .await
            .get(id)
            .is_some_and(|s| s.live)
    }

    /// Sorted identifiers with a live process.
    pub async fn running(&self) -> Vec<PlaygroundId> {
        let slots = self.slots.lock().await;
        let mut ids: Vec<PlaygroundId> = slots
            .iter()
            .filter(|(_, s)| s.live)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Stops the process for `id`, waits for its exit and drops the slot with
    /// its log.
    ///
    /// The wait is bounded by the termination policy. A process still alive
    /// after it gets SIGKILL regardless of policy, followed by a second bounded
    /// wait, so the slot never goes away while its process is known to run.
    pub async fn discard(&self, id: &PlaygroundId) -> Result<(), PlaygroundError> {
        let live = {
            let slots = self.slots.lock().await;
            slots
                .get(id)
                .filter(|s| s.live)
                .map(|s| (s.pid, Arc::clone(&s.latch), s.kill.clone()))
        };

        if let Some((pid, latch, kill)) = live {
            self.stop(id).await?;
            let wait = self.termination.exit_wait(self.drain_timeout);
            if tokio::time::timeout(wait, latch.wait()).await.is_err() {
                warn!(playground = %id, pid, ?wait, "process outlived stop; killing before discard");
                deliver(pid, StopSignal::Kill, &kill)?;
                let wait = TerminationPolicy::Immediate.exit_wait(self.drain_timeout);
                if tokio::time::timeout(wait, latch.wait()).await.is_err() {
                    warn!(playground = %id, pid, ?wait, "process not reaped after SIGKILL");
                }
            }
        }

        self.slots.lock().await.remove(id);
        Ok(())
    }

    /// Stops every live process and waits for their exits (bounded).
    pub async fn shutdown(&self) {
        let live = self.running().await;
        if live.is_empty() {
            return;
        }
        info!(count = live.len(), "stopping all dev processes");
        let waits = live.iter().map(|id| async move {
            if let Err(e) = self.discard(id).await {
                warn!(playground = %id, error = %e, "failed to stop dev process");
            }
        });
        join_all(waits).await;
    }

    /// Sends SIGTERM to every live process group without waiting.
    ///
    /// Best effort for hosts that go away without [`shutdown`](Self::shutdown):
    /// skipped when the table is busy.
    pub(crate) fn terminate_all_now(&self) {
        let Ok(slots) = self.slots.try_lock() else {
            return;
        };
        for (id, slot) in slots.iter().filter(|(_, s)| s.live) {
            if let Err(e) = deliver(slot.pid, StopSignal::Terminate, &slot.kill) {
                debug!(playground = %id, error = %e, "terminate on drop failed");
            }
        }
    }
}

/// Delivers `sig` to the run: process group on unix, direct kill elsewhere.
fn deliver(pid: u32, sig: StopSignal, kill: &CancellationToken) -> Result<(), PlaygroundError> {
    #[cfg(unix)]
    {
        let _ = kill;
        super::shutdown::signal_group(pid, sig)?;
    }
    #[cfg(not(unix))]
    {
        let _ = (pid, sig);
        kill.cancel();
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn supervisor(bus: &Bus, termination: TerminationPolicy) -> Arc<ProcessSupervisor> {
        ProcessSupervisor::new(bus.clone(), 64 * 1024, termination, Duration::from_millis(500))
    }

    async fn next_exit(sub: &mut crate::events::Subscription, id: &PlaygroundId) -> Event {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let ev = sub.recv_for(id).await.expect("bus closed");
                if ev.is_dev_exit() {
                    return ev;
                }
            }
        })
        .await
        .expect("no exit event")
    }

    #[tokio::test]
    async fn concurrent_starts_spawn_one_process() {
        let bus = Bus::new(256);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("solo");

        let mut joins = Vec::new();
        for _ in 0..8 {
            let sup = Arc::clone(&sup);
            let id = id.clone();
            let cwd = dir.path().to_path_buf();
            joins.push(tokio::spawn(async move { sup.start(&id, &cwd, "sleep 5").await }));
        }
        let outcomes: Vec<StartOutcome> = join_all(joins)
            .await
            .into_iter()
            .map(|j| j.unwrap().unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.started).count(), 1);
        let pid = outcomes[0].pid;
        assert!(outcomes.iter().all(|o| o.pid == pid));
        assert_eq!(sup.running().await, vec![id.clone()]);

        sup.discard(&id).await.unwrap();
        assert!(!sup.is_running(&id).await);
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let bus = Bus::new(16);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let err = sup
            .start(&PlaygroundId::from("p"), Path::new("/"), "   ")
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "playground_no_command");
    }

    #[tokio::test]
    async fn missing_cwd_fails_without_phantom_slot() {
        let bus = Bus::new(16);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let id = PlaygroundId::from("p");
        let err = sup
            .start(&id, Path::new("/definitely/not/here"), "echo hi")
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "playground_spawn_failed");
        assert_eq!(sup.status(&id).await, DevStatus::default());
        assert!(sup.running().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_program_fails_synchronously() {
        let bus = Bus::new(16);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("typo");
        let mut sub = bus.subscribe();

        let err = sup
            .start(&id, dir.path(), "definitely-not-a-command-xyz --dev")
            .await
            .unwrap_err();
        match &err {
            PlaygroundError::Spawn { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sup.status(&id).await, DevStatus::default());
        assert!(sub.try_recv().is_none(), "nothing published");
    }

    #[tokio::test]
    async fn stop_without_process_is_noop() {
        let bus = Bus::new(16);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let id = PlaygroundId::from("idle");
        sup.stop(&id).await.unwrap();
        sup.stop(&id).await.unwrap();
        let status = sup.status(&id).await;
        assert!(!status.running);
        assert_eq!(status.log, "");
    }

    #[tokio::test]
    async fn output_then_single_exit_and_log_survives() {
        let bus = Bus::new(256);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("echo");
        let mut sub = bus.subscribe();

        sup.start(&id, dir.path(), "echo out; echo err 1>&2; exit 3")
            .await
            .unwrap();

        let mut chunks = String::new();
        let exit = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let ev = sub.recv_for(&id).await.unwrap();
                match &ev.kind {
                    EventKind::DevLog { chunk } => chunks.push_str(chunk),
                    EventKind::DevExit { .. } => return ev,
                    _ => {}
                }
            }
        })
        .await
        .unwrap();

        assert!(chunks.contains("out"));
        assert!(chunks.contains("err"));
        match exit.kind {
            EventKind::DevExit { code, signal, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(signal, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        let status = sup.status(&id).await;
        assert!(!status.running);
        assert!(status.log.contains("out"));
        assert_eq!(status.last_exit.unwrap().code, Some(3));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sub.try_recv().is_none(), "no second exit event");
    }

    #[tokio::test]
    async fn duplicate_exit_notification_publishes_once() {
        let bus = Bus::new(16);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let id = PlaygroundId::from("dup");
        let latch = ExitLatch::default();
        let mut sub = bus.subscribe();

        sup.finish(&id, 7, &latch, ExitInfo::default()).await;
        sup.finish(&id, 7, &latch, ExitInfo::abnormal("again")).await;

        assert!(sub.try_recv().unwrap().is_dev_exit());
        assert!(sub.try_recv().is_none());
        assert!(latch.has_exited());
    }

    #[tokio::test]
    async fn stop_reaches_the_whole_group() {
        let bus = Bus::new(256);
        let sup = supervisor(&bus, TerminationPolicy::SignalOnly);
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("group");
        let mut sub = bus.subscribe();

        // `sleep` runs as a child of the shell and keeps stdout open.
        sup.start(&id, dir.path(), "sleep 30; echo never").await.unwrap();
        sup.stop(&id).await.unwrap();

        let ev = next_exit(&mut sub, &id).await;
        match ev.kind {
            EventKind::DevExit { signal, .. } => assert_eq!(signal.as_deref(), Some("SIGTERM")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!sup.status(&id).await.log.contains("never"));
    }

    #[tokio::test]
    async fn ignored_sigterm_escalates_to_kill() {
        let bus = Bus::new(256);
        let sup = supervisor(
            &bus,
            TerminationPolicy::Graceful {
                grace: Duration::from_millis(300),
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("stubborn");
        let mut sub = bus.subscribe();

        sup.start(&id, dir.path(), "trap '' TERM; echo ready; while true; do sleep 0.1; done")
            .await
            .unwrap();
        // Wait until the trap is installed.
        loop {
            let ev = sub.recv_for(&id).await.unwrap();
            if ev.chunk().is_some_and(|c| c.contains("ready")) {
                break;
            }
        }
        sup.stop(&id).await.unwrap();

        let ev = next_exit(&mut sub, &id).await;
        match ev.kind {
            EventKind::DevExit { signal, .. } => assert_eq!(signal.as_deref(), Some("SIGKILL")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn restart_after_exit_replaces_buffer() {
        let bus = Bus::new(256);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("again");
        let mut sub = bus.subscribe();

        sup.start(&id, dir.path(), "echo first").await.unwrap();
        next_exit(&mut sub, &id).await;
        let second = sup.start(&id, dir.path(), "echo second").await.unwrap();
        assert!(second.started);
        next_exit(&mut sub, &id).await;

        let log = sup.status(&id).await.log;
        assert!(log.contains("second"));
        assert!(!log.contains("first"));
    }

    /// Always fails.
    struct BrokenPipe;

    impl tokio::io::AsyncRead for BrokenPipe {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("pipe torn")))
        }
    }

    #[tokio::test]
    async fn output_failure_ends_the_run_with_one_abnormal_exit() {
        let bus = Bus::new(64);
        let sup = supervisor(&bus, TerminationPolicy::default());
        let id = PlaygroundId::from("torn");
        let mut sub = bus.subscribe();

        let child = shell::shell_command("sleep 30")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        {
            let mut slots = sup.slots.lock().await;
            let stdout: OutputStream = Box::new(BrokenPipe);
            let out = sup.adopt(&mut slots, &id, pid, child, Some(stdout), None, "sleep 30");
            assert!(out.started);
        }

        let ev = next_exit(&mut sub, &id).await;
        match ev.kind {
            EventKind::DevExit { code, error, .. } => {
                assert_eq!(code, None);
                assert!(error.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!sup.is_running(&id).await);
        assert!(sup.status(&id).await.last_exit.unwrap().error.is_some());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sub.try_recv().is_none(), "no second exit event");
    }

    #[tokio::test]
    async fn discard_kills_what_the_policy_only_asked_to_stop() {
        let bus = Bus::new(256);
        let sup = supervisor(&bus, TerminationPolicy::SignalOnly);
        let dir = tempfile::tempdir().unwrap();
        let id = PlaygroundId::from("deaf");
        let mut sub = bus.subscribe();

        let pid = sup
            .start(&id, dir.path(), "trap '' TERM; echo ready; while true; do sleep 0.1; done")
            .await
            .unwrap()
            .pid
            .unwrap();
        loop {
            let ev = sub.recv_for(&id).await.unwrap();
            if ev.chunk().is_some_and(|c| c.contains("ready")) {
                break;
            }
        }

        sup.discard(&id).await.unwrap();

        let ev = next_exit(&mut sub, &id).await;
        match ev.kind {
            EventKind::DevExit { signal, .. } => assert_eq!(signal.as_deref(), Some("SIGKILL")),
            other => panic!("unexpected {other:?}"),
        }
        let gone = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            None::<nix::sys::signal::Signal>,
        );
        assert_eq!(gone, Err(nix::errno::Errno::ESRCH));
        assert_eq!(sup.status(&id).await, DevStatus::default());
    }
}
