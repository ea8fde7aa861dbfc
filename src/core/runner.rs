//! # Output pump for a single supervised run.
//!
//! One pump task per run owns the [`Child`]: it reads stdout and stderr
//! concurrently, feeds each decoded chunk into the run's [`LogRingBuffer`] and
//! the [`Bus`], and resolves to the run's [`ExitInfo`].
//!
//! ## Flow
//! ```text
//! loop select! {
//!   stdout.read ──► Utf8Chunker ──► log.push_str + Bus(DevLog)
//!   stderr.read ──► Utf8Chunker ──► log.push_str + Bus(DevLog)
//!   child.wait  ──► status recorded, drain timer armed
//!   drain timer ──► stop reading (pipes held open by grandchildren)
//!   kill token  ──► child.start_kill()
//! } until both streams hit EOF and the status is known
//!
//! read error ──► kill process group ──► reap ──► ExitInfo::abnormal
//! ```
//!
//! ## Rules
//! - Chunks are published in the order reads complete; a chunk may end mid-line
//!   but never mid-character.
//! - The pump returns only after the last chunk was published, so the caller
//!   can publish `DevExit` strictly after all output of the run.
//! - The pump never publishes `DevExit` itself.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::log_buffer::{LogRingBuffer, Utf8Chunker};
use crate::events::{Bus, Event, ExitInfo};
use crate::registry::PlaygroundId;

const READ_CHUNK: usize = 8 * 1024;

/// One captured output stream of a run.
pub(crate) type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Everything a pump needs; moved into the pump task.
pub(crate) struct Run {
    pub id: PlaygroundId,
    pub child: Child,
    pub stdout: Option<OutputStream>,
    pub stderr: Option<OutputStream>,
    pub log: Arc<Mutex<LogRingBuffer>>,
    pub bus: Bus,
    pub drain_timeout: Duration,
    /// Cancelled to request a direct kill of the child.
    pub kill: CancellationToken,
}

/// Drives one run to completion and returns how it ended.
pub(crate) async fn pump(mut run: Run) -> ExitInfo {
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_dec = Utf8Chunker::new();
    let mut err_dec = Utf8Chunker::new();

    let mut status: Option<ExitInfo> = None;
    let mut io_error: Option<String> = None;
    let mut killed = false;

    let drain = time::sleep(Duration::from_secs(86_400));
    tokio::pin!(drain);

    loop {
        if run.stdout.is_none() && run.stderr.is_none() && status.is_some() {
            break;
        }

        tokio::select! {
            res = read_chunk(&mut run.stdout, &mut out_buf), if run.stdout.is_some() => match res {
                Ok(0) => {
                    emit(&run, out_dec.finish());
                    run.stdout = None;
                }
                Ok(n) => emit(&run, out_dec.push(&out_buf[..n])),
                Err(e) => {
                    io_error = Some(format!("stdout read failed: {e}"));
                    break;
                }
            },
            res = read_chunk(&mut run.stderr, &mut err_buf), if run.stderr.is_some() => match res {
                Ok(0) => {
                    emit(&run, err_dec.finish());
                    run.stderr = None;
                }
                Ok(n) => emit(&run, err_dec.push(&err_buf[..n])),
                Err(e) => {
                    io_error = Some(format!("stderr read failed: {e}"));
                    break;
                }
            },
            res = run.child.wait(), if status.is_none() => {
                status = Some(match res {
                    Ok(st) => ExitInfo::from_status(st),
                    Err(e) => ExitInfo::abnormal(format!("wait failed: {e}")),
                });
                drain.as_mut().reset(Instant::now() + run.drain_timeout);
            },
            _ = &mut drain, if status.is_some() => {
                debug!(playground = %run.id, "output still open after exit; drain window elapsed");
                break;
            },
            _ = run.kill.cancelled(), if !killed => {
                killed = true;
                if let Err(e) = run.child.start_kill() {
                    debug!(playground = %run.id, error = %e, "direct kill failed");
                }
            },
        }
    }

    emit(&run, out_dec.finish());
    emit(&run, err_dec.finish());

    if let Some(err) = io_error {
        warn!(playground = %run.id, error = %err, "output stream failed; terminating run");
        abort(&mut run).await;
        return ExitInfo::abnormal(err);
    }

    // `status` is always set unless an I/O error broke the loop.
    status.unwrap_or_else(|| ExitInfo::abnormal("exit status unavailable"))
}

async fn read_chunk<R: AsyncRead + Unpin>(stream: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match stream {
        Some(s) => s.read(buf).await,
        None => std::future::pending().await,
    }
}

fn emit(run: &Run, chunk: Option<String>) {
    let Some(chunk) = chunk else { return };
    run.log
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .push_str(&chunk);
    run.bus.publish(Event::dev_log(run.id.clone(), chunk));
}

/// Kills the whole run after an output failure and reaps the child.
async fn abort(run: &mut Run) {
    #[cfg(unix)]
    if let Some(pid) = run.child.id() {
        if let Err(e) = super::shutdown::signal_group(pid, crate::policies::StopSignal::Kill) {
            debug!(playground = %run.id, error = %e, "group kill failed");
        }
    }
    let _ = run.child.start_kill();
    if time::timeout(run.drain_timeout.max(Duration::from_millis(100)), run.child.wait())
        .await
        .is_err()
    {
        warn!(playground = %run.id, "child not reaped after forced kill");
    }
}
