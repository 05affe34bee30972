// src/exec/engine.rs

//! Spawning and supervising one process.
//!
//! Every spawn starts a small set of Tokio tasks that run concurrently:
//!
//! - a feeder writing the stdin [`LineStream`] into the child's stdin pipe,
//! - one reader per piped output channel, forwarding lines into a bounded
//!   channel that the caller sees as a [`LineStream`],
//! - a supervisor owning the child, which waits for it, waits for the output
//!   pipes to reach EOF and publishes the [`ExitStatus`].
//!
//! Feeding and draining never wait on each other, so a child that writes
//! before it has read all of its input cannot wedge the two pipes. The
//! supervisor always reaps the child, even when the caller has dropped every
//! handle, and never waits on the caller reading its output.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, ShellError};
use crate::exec::command::CommandSpec;
use crate::exec::process::RunningProcess;
use crate::status::ExitStatus;
use crate::stream::LineStream;

/// How long readers may keep going after a kill before they are abandoned.
///
/// A killed shell can leave grandchildren holding the output pipes open.
const KILL_GRACE: Duration = Duration::from_millis(250);

/// Start `spec` with `stdin` as its standard input.
///
/// Returns as soon as the process exists; output streams and the final
/// status are obtained from the returned [`RunningProcess`]. A process that
/// cannot be started yields [`ShellError::Spawn`] and no status at all.
///
/// Must be called from within a Tokio runtime.
pub fn spawn(spec: &CommandSpec, stdin: LineStream) -> Result<RunningProcess> {
    let command = spec.display();
    let mut child = spec
        .to_command()
        .spawn()
        .map_err(|source| ShellError::Spawn {
            command: command.clone(),
            source,
        })?;

    let pid = child.id();
    info!(cmd = %command, pid, "spawned process");

    let feeder = child
        .stdin
        .take()
        .map(|pipe| tokio::spawn(feed_stdin(stdin, pipe, command.clone())));

    let capacity = spec.buffer_lines();
    let (state, state_rx) = watch::channel(ChildState::Running);
    let mut eofs = Vec::new();

    let stdout = child.stdout.take().map(|pipe| {
        let (tx, stream) = LineStream::channel(capacity);
        let (eof_tx, eof_rx) = oneshot::channel();
        eofs.push(eof_rx);
        tokio::spawn(drain_output(pipe, tx, state_rx.clone(), eof_tx, "stdout", command.clone()));
        stream
    });

    let stderr = child.stderr.take().map(|pipe| {
        let (tx, stream) = LineStream::channel(capacity);
        let (eof_tx, eof_rx) = oneshot::channel();
        eofs.push(eof_rx);
        tokio::spawn(drain_output(pipe, tx, state_rx.clone(), eof_tx, "stderr", command.clone()));
        stream
    });

    let (kill_tx, kill_rx) = oneshot::channel::<()>();
    let (done_tx, done_rx) = oneshot::channel::<Result<ExitStatus>>();

    let supervisor = Supervisor {
        child,
        feeder,
        state,
        eofs,
        kill_rx,
        timeout: spec.time_limit(),
        command: command.clone(),
    };

    tokio::spawn(async move {
        let outcome = supervisor.run().await;
        // Nobody listening means the caller dropped the handle; the child
        // has been reaped regardless.
        let _ = done_tx.send(outcome);
    });

    Ok(RunningProcess::new(command, pid, stdout, stderr, kill_tx, done_rx))
}

/// Write every line of `input` to the child's stdin, then close it.
///
/// Returns the number of lines written. A child that stops reading (broken
/// pipe) simply ends the feed. An error from `input` itself is returned as
/// [`ShellError::Input`].
async fn feed_stdin(mut input: LineStream, mut pipe: ChildStdin, command: String) -> Result<u64> {
    let mut fed = 0u64;

    loop {
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(cmd = %command, error = %e, "stdin source failed");
                return Err(ShellError::Input(e));
            }
        };

        let mut bytes = line.into_bytes();
        bytes.push(b'\n');

        if let Err(e) = pipe.write_all(&bytes).await {
            log_write_error(&command, fed, &e);
            return Ok(fed);
        }
        fed += 1;
    }

    if let Err(e) = pipe.shutdown().await {
        log_write_error(&command, fed, &e);
    }

    debug!(cmd = %command, lines = fed, "stdin closed");
    Ok(fed)
}

fn log_write_error(command: &str, fed: u64, e: &io::Error) {
    if e.kind() == io::ErrorKind::BrokenPipe {
        debug!(cmd = %command, lines = fed, "process closed stdin early");
    } else {
        warn!(cmd = %command, lines = fed, error = %e, "writing to stdin failed; input truncated");
    }
}

/// What the supervisor tells the output readers about the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildState {
    Running,
    /// Reaped; readers drain the pipe to EOF without waiting for the consumer.
    Exited,
    /// Stop reading; the pipe may be held open by a leftover grandchild.
    Abandoned,
}

/// Forward lines from an output pipe into `tx`.
///
/// While the child runs, at most one line is held back, so a slow consumer
/// slows the child down through the full pipe. Once the child has exited the
/// rest of the pipe is read into a backlog regardless of the consumer, `eof`
/// fires at pipe EOF and the backlog is then forwarded at the consumer's
/// pace. The supervisor therefore only waits on the pipe, never on the
/// caller.
///
/// Dropping the stream closes the pipe, so a child that keeps writing gets
/// `EPIPE`/`SIGPIPE` instead of blocking forever. An abandoned reader ends
/// the stream with an [`io::ErrorKind::Interrupted`] item so truncated
/// output cannot be mistaken for a clean end.
async fn drain_output<R>(
    pipe: R,
    tx: mpsc::Sender<io::Result<String>>,
    mut state: watch::Receiver<ChildState>,
    eof: oneshot::Sender<u64>,
    channel: &'static str,
    command: String,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = Some(BufReader::new(pipe).lines());
    let mut eof = Some(eof);
    let mut backlog: VecDeque<io::Result<String>> = VecDeque::new();
    let mut exited = false;
    let mut watching = true;
    let mut read = 0u64;

    while lines.is_some() || !backlog.is_empty() {
        let may_read = lines.is_some() && (exited || backlog.is_empty());

        tokio::select! {
            next = async {
                match lines.as_mut() {
                    Some(lines) => lines.next_line().await,
                    None => std::future::pending().await,
                }
            }, if may_read => {
                match next {
                    Ok(Some(line)) => {
                        read += 1;
                        backlog.push_back(Ok(line));
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(cmd = %command, channel, error = %e, "reading output failed");
                        backlog.push_back(Err(e));
                    }
                }
                lines = None;
                if let Some(eof) = eof.take() {
                    let _ = eof.send(read);
                }
            }

            permit = tx.reserve(), if !backlog.is_empty() => {
                let Ok(permit) = permit else {
                    debug!(cmd = %command, channel, lines = read, "consumer dropped stream; closing pipe");
                    break;
                };
                if let Some(item) = backlog.pop_front() {
                    permit.send(item);
                }
            }

            () = tx.closed(), if backlog.is_empty() => {
                debug!(cmd = %command, channel, lines = read, "consumer dropped stream; closing pipe");
                break;
            }

            changed = state.changed(), if watching => {
                let now = match changed {
                    Ok(()) => *state.borrow_and_update(),
                    // Supervisor gone without a verdict: keep reading to EOF.
                    Err(_) => {
                        watching = false;
                        ChildState::Exited
                    }
                };
                match now {
                    ChildState::Running => {}
                    ChildState::Exited => exited = true,
                    ChildState::Abandoned => {
                        watching = false;
                        if lines.take().is_some() {
                            debug!(cmd = %command, channel, lines = read, "output still open; abandoning pipe");
                            backlog.push_back(Err(io::Error::new(
                                io::ErrorKind::Interrupted,
                                format!("{channel} of `{command}` abandoned before end of output"),
                            )));
                        }
                    }
                }
            }
        }
    }

    debug!(cmd = %command, channel, lines = read, "output reader finished");
}

struct Supervisor {
    child: Child,
    feeder: Option<JoinHandle<Result<u64>>>,
    state: watch::Sender<ChildState>,
    eofs: Vec<oneshot::Receiver<u64>>,
    kill_rx: oneshot::Receiver<()>,
    timeout: Option<Duration>,
    command: String,
}

impl Supervisor {
    async fn run(self) -> Result<ExitStatus> {
        let Supervisor {
            mut child,
            mut feeder,
            state,
            eofs,
            mut kill_rx,
            timeout,
            command,
        } = self;

        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut kill_open = true;
        let mut timed_out = false;
        let mut killed = false;
        let mut input_error: Option<ShellError> = None;

        let wait_result = loop {
            let feeder_running = feeder.is_some();

            tokio::select! {
                res = child.wait() => break res,

                req = &mut kill_rx, if kill_open => {
                    kill_open = false;
                    // A dropped sender only means the handle went away.
                    if req.is_ok() {
                        info!(cmd = %command, "kill requested");
                        killed = true;
                        kill(&mut child, &command);
                    }
                }

                () = &mut deadline, if !timed_out => {
                    timed_out = true;
                    killed = true;
                    warn!(cmd = %command, ?timeout, "process timed out; killing");
                    kill(&mut child, &command);
                }

                joined = async {
                    match feeder.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if feeder_running => {
                    feeder = None;
                    if let Some(err) = feeder_failure(joined) {
                        input_error = Some(err);
                        killed = true;
                        kill(&mut child, &command);
                    }
                }
            }
        };

        let status = match wait_result {
            Ok(raw) => ExitStatus::from(raw),
            Err(e) => {
                warn!(cmd = %command, error = %e, "waiting for process failed");
                state.send_replace(ChildState::Abandoned);
                return Err(ShellError::Io(e));
            }
        };
        state.send_replace(ChildState::Exited);

        // Output is complete only once the far ends have closed. A kill
        // request or the deadline still cuts this short.
        let grace = tokio::time::sleep(KILL_GRACE);
        tokio::pin!(grace);

        let all_eof = async {
            let mut read = Vec::with_capacity(eofs.len());
            for eof in eofs {
                read.push(eof.await.unwrap_or(0));
            }
            read
        };
        tokio::pin!(all_eof);

        let mut abandoned = false;
        let drained = loop {
            tokio::select! {
                read = &mut all_eof => break read,

                req = &mut kill_rx, if kill_open => {
                    kill_open = false;
                    if req.is_ok() {
                        info!(cmd = %command, "kill requested after exit; abandoning output");
                        abandoned = true;
                        break Vec::new();
                    }
                }

                () = &mut deadline, if !timed_out => {
                    timed_out = true;
                    warn!(cmd = %command, ?timeout, "output still open at deadline; abandoning");
                    abandoned = true;
                    break Vec::new();
                }

                () = &mut grace, if killed => {
                    debug!(cmd = %command, "output still open after kill; abandoning readers");
                    abandoned = true;
                    break Vec::new();
                }
            }
        };
        if abandoned {
            state.send_replace(ChildState::Abandoned);
        }

        // The child is gone, so remaining input has nowhere to go.
        if let Some(handle) = feeder.take() {
            handle.abort();
            if let Some(err) = feeder_failure(handle.await) {
                input_error = Some(err);
            }
        }

        info!(
            cmd = %command,
            %status,
            lines = ?drained,
            timed_out,
            abandoned,
            "process exited"
        );

        match input_error {
            Some(err) => Err(err),
            None => Ok(status),
        }
    }
}

fn kill(child: &mut Child, command: &str) {
    if let Err(e) = child.start_kill() {
        // Already exited is the common case here.
        debug!(cmd = %command, error = %e, "kill failed");
    }
}

/// Extract an input failure from a finished feeder task, if it had one.
fn feeder_failure(
    joined: std::result::Result<Result<u64>, tokio::task::JoinError>,
) -> Option<ShellError> {
    match joined {
        Ok(Ok(_)) => None,
        Ok(Err(err)) => Some(err),
        Err(join_err) if join_err.is_cancelled() => None,
        Err(join_err) => Some(ShellError::Other(anyhow::anyhow!(
            "stdin feeder panicked: {join_err}"
        ))),
    }
}
