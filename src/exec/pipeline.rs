// src/exec/pipeline.rs

//! Chains of processes where each stage's stdout is the next stage's stdin.

use tracing::{debug, info};

use crate::errors::{Result, ShellError};
use crate::exec::command::{CommandSpec, StdioMode};
use crate::exec::engine::spawn;
use crate::exec::process::{Output, RunningProcess};
use crate::status::ExitStatus;
use crate::stream::LineStream;

/// A running chain of processes.
///
/// Stage `i`'s stdout stream is moved into stage `i + 1` as its stdin, so the
/// stages run concurrently and apply backpressure to each other through the
/// bounded line buffers.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<RunningProcess>,
    stdout: Option<LineStream>,
}

/// Spawn `specs` in order, wiring them together, with `stdin` feeding the
/// first stage.
///
/// Every stage but the last has its stdout forced to [`StdioMode::Piped`].
/// If any stage fails to spawn, the stages already started are killed and
/// the spawn error is returned.
pub fn pipeline(specs: &[CommandSpec], stdin: LineStream) -> Result<Pipeline> {
    if specs.is_empty() {
        return Err(ShellError::Other(anyhow::anyhow!(
            "pipeline needs at least one command"
        )));
    }

    let mut stages: Vec<RunningProcess> = Vec::with_capacity(specs.len());
    let mut input = stdin;
    let last = specs.len() - 1;

    for (i, spec) in specs.iter().enumerate() {
        let spec = if i < last {
            spec.clone().stdout(StdioMode::Piped)
        } else {
            spec.clone()
        };

        let mut stage = match spawn(&spec, input) {
            Ok(stage) => stage,
            Err(err) => {
                debug!(stage = i, "pipeline stage failed to spawn; killing earlier stages");
                for started in stages.iter_mut() {
                    started.kill();
                }
                return Err(err);
            }
        };

        input = stage.take_stdout().unwrap_or_default();
        stages.push(stage);
    }

    let stdout = if specs[last].stdout_mode() == StdioMode::Piped {
        Some(input)
    } else {
        None
    };

    info!(
        stages = stages.len(),
        cmd = %stages.iter().map(RunningProcess::command).collect::<Vec<_>>().join(" | "),
        "pipeline started"
    );

    Ok(Pipeline { stages, stdout })
}

impl Pipeline {
    /// Stdout of the last stage, if it was piped.
    pub fn take_stdout(&mut self) -> Option<LineStream> {
        self.stdout.take()
    }

    /// Stderr stream of stage `index`, if piped.
    pub fn take_stderr(&mut self, index: usize) -> Option<LineStream> {
        self.stages.get_mut(index).and_then(RunningProcess::take_stderr)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Kill every stage.
    pub fn kill(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.kill();
        }
    }

    /// Wait for every stage; statuses come back in stage order.
    pub async fn wait(mut self) -> Result<Vec<ExitStatus>> {
        self.stdout = None;
        let mut statuses = Vec::with_capacity(self.stages.len());
        for stage in self.stages {
            statuses.push(stage.wait().await?);
        }
        Ok(statuses)
    }

    /// Collect the last stage's stdout and every piped stderr, then wait for
    /// every stage.
    ///
    /// Stderr lines are grouped by stage, in stage order. The returned status
    /// is the last stage's, as a shell would report it.
    pub async fn output(mut self) -> Result<Output> {
        let stderr_tasks: Vec<_> = self
            .stages
            .iter_mut()
            .filter_map(RunningProcess::take_stderr)
            .map(|stream| tokio::spawn(stream.collect_lines()))
            .collect();

        let stdout = match self.stdout.take() {
            Some(stream) => stream.collect_lines().await?,
            None => Vec::new(),
        };

        let mut stderr = Vec::new();
        for task in stderr_tasks {
            let lines = task
                .await
                .map_err(|e| ShellError::Other(anyhow::anyhow!("stderr collector failed: {e}")))??;
            stderr.extend(lines);
        }

        let statuses = self.wait().await?;
        let status = statuses.last().copied().unwrap_or(ExitStatus::Succeeded);

        Ok(Output {
            status,
            stdout,
            stderr,
        })
    }
}
