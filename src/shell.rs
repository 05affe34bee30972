// src/shell.rs

//! Convenience entry points for scripts.
//!
//! [`Shell`] binds a [`Config`] to the usual ways of running a command:
//!
//! | operation        | stdout            | non-zero exit        |
//! |------------------|-------------------|----------------------|
//! | `system`         | inherited         | returned as status   |
//! | `system_strict`  | inherited         | `CommandFailed`      |
//! | `proc`           | inherited         | returned as status   |
//! | `proc_strict`    | inherited         | `CommandFailed`      |
//! | `inshell`        | lazy `LineStream` | from `wait()`        |
//! | `inproc`         | lazy `LineStream` | from `wait()`        |
//! | `output`         | collected         | returned in `Output` |
//!
//! `system`/`inshell` go through the command interpreter; `proc`/`inproc`
//! execute the program directly. The free functions at the crate root use
//! [`Shell::default`].

use tracing::debug;

use crate::config::Config;
use crate::errors::Result;
use crate::exec::{
    pipeline, spawn, CommandSpec, Output, Pipeline, RunningProcess, StdioMode,
};
use crate::status::ExitStatus;
use crate::stream::LineStream;

#[derive(Debug, Clone, Default)]
pub struct Shell {
    config: Config,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shell-mode spec with this shell's defaults applied.
    pub fn command(&self, text: impl Into<String>) -> CommandSpec {
        CommandSpec::shell(text).configured(&self.config)
    }

    /// Direct-exec spec with this shell's defaults applied.
    pub fn program<I, S>(&self, program: impl Into<String>, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::exec(program).args(args).configured(&self.config)
    }

    /// Run `spec` with stdout and stderr going to this process's own.
    pub async fn run(&self, spec: CommandSpec, stdin: LineStream) -> Result<ExitStatus> {
        let spec = spec.stdout(StdioMode::Inherit).stderr(StdioMode::Inherit);
        spawn(&spec, stdin)?.wait().await
    }

    pub async fn system(&self, command: &str, stdin: LineStream) -> Result<ExitStatus> {
        self.run(self.command(command), stdin).await
    }

    pub async fn system_strict(&self, command: &str, stdin: LineStream) -> Result<()> {
        self.system(command, stdin).await?.check(command)
    }

    pub async fn proc<I, S>(&self, program: &str, args: I, stdin: LineStream) -> Result<ExitStatus>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(self.program(program, args), stdin).await
    }

    pub async fn proc_strict<I, S>(&self, program: &str, args: I, stdin: LineStream) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.program(program, args);
        let display = spec.display();
        self.run(spec, stdin).await?.check(display)
    }

    /// Start a shell command and hand back its stdout as a lazy stream.
    pub fn inshell(&self, command: &str, stdin: LineStream) -> Result<RunningProcess> {
        spawn(&self.command(command).stdout(StdioMode::Piped), stdin)
    }

    pub fn inproc<I, S>(&self, program: &str, args: I, stdin: LineStream) -> Result<RunningProcess>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        spawn(&self.program(program, args).stdout(StdioMode::Piped), stdin)
    }

    /// Run `spec` with stdout and stderr piped and collected in full.
    pub async fn output(&self, spec: CommandSpec, stdin: LineStream) -> Result<Output> {
        let spec = spec.stdout(StdioMode::Piped).stderr(StdioMode::Piped);
        debug!(cmd = %spec, "collecting output");
        spawn(&spec, stdin)?.output().await
    }

    /// Like [`output`](Self::output) but a non-zero exit is an error.
    pub async fn output_strict(&self, spec: CommandSpec, stdin: LineStream) -> Result<Output> {
        let display = spec.display();
        self.output(spec, stdin).await?.check(&display)
    }

    /// Chain shell commands like `a | b | c`.
    pub fn pipeline(&self, commands: &[&str], stdin: LineStream) -> Result<Pipeline> {
        let specs: Vec<CommandSpec> = commands.iter().map(|c| self.command(*c)).collect();
        pipeline(&specs, stdin)
    }
}

pub async fn system(command: &str, stdin: LineStream) -> Result<ExitStatus> {
    Shell::default().system(command, stdin).await
}

pub async fn system_strict(command: &str, stdin: LineStream) -> Result<()> {
    Shell::default().system_strict(command, stdin).await
}

pub async fn proc<I, S>(program: &str, args: I, stdin: LineStream) -> Result<ExitStatus>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Shell::default().proc(program, args, stdin).await
}

pub async fn proc_strict<I, S>(program: &str, args: I, stdin: LineStream) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Shell::default().proc_strict(program, args, stdin).await
}

pub fn inshell(command: &str, stdin: LineStream) -> Result<RunningProcess> {
    Shell::default().inshell(command, stdin)
}

pub fn inproc<I, S>(program: &str, args: I, stdin: LineStream) -> Result<RunningProcess>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Shell::default().inproc(program, args, stdin)
}

pub async fn output(spec: CommandSpec, stdin: LineStream) -> Result<Output> {
    Shell::default().output(spec, stdin).await
}
