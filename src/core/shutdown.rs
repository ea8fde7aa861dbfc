//! # Signal plumbing.
//!
//! Two directions:
//! - **Outbound**: [`signal_group`] delivers a [`StopSignal`] to a supervised
//!   process group (unix). Dev processes are spawned as group leaders, so the
//!   group id equals the pid.
//! - **Inbound**: [`wait_for_shutdown_signal`] completes when the host process
//!   receives a termination signal, so the embedding application can stop every
//!   supervised process before exiting.
//!
//! ## Inbound signals
//! **Unix platforms:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! **Windows platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].

use crate::policies::StopSignal;

/// Sends `sig` to the process group led by `pid`.
///
/// A group that no longer exists (`ESRCH`) counts as delivered: the process
/// already exited and its exit event is on the way.
#[cfg(unix)]
pub(crate) fn signal_group(pid: u32, sig: StopSignal) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("pid {pid} out of range"))
    })?;
    if raw <= 1 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("refusing to signal pid {raw}"),
        ));
    }
    let signal = match sig {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    match signal::killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(std::io::Error::from(e)),
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when Ctrl-C is received, or `Err` if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn refuses_init_and_pid_zero() {
        assert!(signal_group(0, StopSignal::Terminate).is_err());
        assert!(signal_group(1, StopSignal::Kill).is_err());
    }

    #[tokio::test]
    async fn missing_group_counts_as_delivered() {
        let mut child = tokio::process::Command::new("true")
            .process_group(0)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        child.wait().await.unwrap();
        assert!(signal_group(pid, StopSignal::Terminate).is_ok());
    }
}
