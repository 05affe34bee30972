// src/exec/process.rs

//! Handle to a spawned process.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::{Result, ShellError};
use crate::status::ExitStatus;
use crate::stream::LineStream;

/// A process started by [`spawn`](crate::exec::spawn).
///
/// The output streams are taken out of the handle with
/// [`take_stdout`](Self::take_stdout) / [`take_stderr`](Self::take_stderr) and
/// consumed independently. The status arrives through [`wait`](Self::wait),
/// which resolves once the process has exited and its output pipes have
/// reached EOF. Lines the caller has not read yet stay buffered in the
/// streams; the status never waits for them to be consumed.
///
/// Dropping the handle does not kill the process; it keeps running and is
/// reaped in the background. Dropping an output stream closes that pipe.
#[derive(Debug)]
pub struct RunningProcess {
    command: String,
    pid: Option<u32>,
    stdout: Option<LineStream>,
    stderr: Option<LineStream>,
    kill_tx: Option<oneshot::Sender<()>>,
    done_rx: oneshot::Receiver<Result<ExitStatus>>,
}

/// Fully collected result of a process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl Output {
    /// `Err(CommandFailed)` unless the process succeeded.
    pub fn check(self, command: &str) -> Result<Self> {
        self.status.check(command)?;
        Ok(self)
    }
}

impl RunningProcess {
    pub(crate) fn new(
        command: String,
        pid: Option<u32>,
        stdout: Option<LineStream>,
        stderr: Option<LineStream>,
        kill_tx: oneshot::Sender<()>,
        done_rx: oneshot::Receiver<Result<ExitStatus>>,
    ) -> Self {
        Self {
            command,
            pid,
            stdout,
            stderr,
            kill_tx: Some(kill_tx),
            done_rx,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// OS process id, if the process was still alive when spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the stdout stream. `None` if stdout was not piped or was already
    /// taken.
    pub fn take_stdout(&mut self) -> Option<LineStream> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<LineStream> {
        self.stderr.take()
    }

    /// Ask for the process to be killed. The status is still delivered by
    /// [`wait`](Self::wait) once it has been reaped.
    ///
    /// Output pipes still open shortly after the kill (held by a leftover
    /// grandchild, say) are abandoned; their streams then end with an
    /// [`ErrorKind::Interrupted`](std::io::ErrorKind::Interrupted) error
    /// instead of a clean end. If the process had already exited, the kill
    /// only abandons such pipes and the process's own status is kept.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            debug!(cmd = %self.command, "sending kill request");
            let _ = tx.send(());
        }
    }

    /// Wait for the process to finish and return its status.
    ///
    /// Any stream still held by the handle is dropped first, which closes
    /// those pipes. Streams already taken may be held unread while waiting: a
    /// process that has exited is reported even though its remaining output
    /// has not been consumed. A process still running and blocked on a full
    /// pipe is another matter; use [`wait_timeout`](Self::wait_timeout) or a
    /// [`CommandSpec::timeout`](crate::exec::CommandSpec::timeout) to bound
    /// that.
    pub async fn wait(mut self) -> Result<ExitStatus> {
        self.stdout = None;
        self.stderr = None;
        let command = self.command.clone();
        await_done(self.done_rx, &command).await
    }

    /// Like [`wait`](Self::wait), but kill the process if it has not finished
    /// within `limit`. A killed process reports
    /// [`ExitStatus::KilledBySignal`] on Unix. See [`kill`](Self::kill) for
    /// what happens to output pipes that stay open.
    pub async fn wait_timeout(mut self, limit: Duration) -> Result<ExitStatus> {
        self.stdout = None;
        self.stderr = None;
        let command = self.command.clone();
        let mut done_rx = self.done_rx;

        tokio::select! {
            res = &mut done_rx => finish(res, &command),
            () = tokio::time::sleep(limit) => {
                debug!(cmd = %command, ?limit, "wait timed out; killing");
                if let Some(tx) = self.kill_tx.take() {
                    let _ = tx.send(());
                }
                await_done(done_rx, &command).await
            }
        }
    }

    /// Read stdout and stderr to the end concurrently, then wait.
    ///
    /// Channels that were not piped come back empty.
    pub async fn output(mut self) -> Result<Output> {
        let stdout = self.stdout.take();
        let stderr = self.stderr.take();

        let (out, err) = tokio::join!(collect(stdout), collect(stderr));
        let status = self.wait().await?;

        Ok(Output {
            status,
            stdout: out?,
            stderr: err?,
        })
    }
}

async fn collect(stream: Option<LineStream>) -> std::io::Result<Vec<String>> {
    match stream {
        Some(s) => s.collect_lines().await,
        None => Ok(Vec::new()),
    }
}

async fn await_done(
    done_rx: oneshot::Receiver<Result<ExitStatus>>,
    command: &str,
) -> Result<ExitStatus> {
    finish(done_rx.await, command)
}

fn finish(
    res: std::result::Result<Result<ExitStatus>, oneshot::error::RecvError>,
    command: &str,
) -> Result<ExitStatus> {
    match res {
        Ok(outcome) => outcome,
        Err(_) => Err(ShellError::Other(anyhow::anyhow!(
            "supervisor for `{command}` ended without reporting a status"
        ))),
    }
}
