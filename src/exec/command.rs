// src/exec/command.rs

//! Description of a process to start: what to run, where, with which
//! environment, and what to do with its output channels.
//!
//! A [`CommandSpec`] is a plain value and can be cloned and reused. The stdin
//! [`LineStream`](crate::stream::LineStream) is *not* part of it, because a
//! stream has a single consumer and is used up by one spawn.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::Config;

/// Default number of lines buffered between an output pipe and its consumer.
pub const DEFAULT_LINE_BUFFER: usize = 64;

/// What to do with one of the child's output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Deliver the channel as a [`LineStream`](crate::stream::LineStream).
    Piped,
    /// Share the parent's descriptor.
    Inherit,
    /// Discard.
    Null,
}

impl StdioMode {
    fn to_stdio(self) -> Stdio {
        match self {
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

/// Command interpreter used for shell-mode invocations, e.g. `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub flag: String,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        if cfg!(windows) {
            Self::new("cmd", "/C")
        } else {
            Self::new("sh", "-c")
        }
    }
}

/// How the process is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Handed verbatim to the [`Interpreter`].
    Shell(String),
    /// Executed directly, no interpreter involved.
    Exec { program: String, args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvChange {
    Set(OsString, OsString),
    Remove(OsString),
}

/// Everything needed to start one process, minus its stdin stream.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    invocation: Invocation,
    interpreter: Interpreter,
    cwd: Option<PathBuf>,
    env_clear: bool,
    env: Vec<EnvChange>,
    stdout: StdioMode,
    stderr: StdioMode,
    line_buffer: usize,
    timeout: Option<Duration>,
}

impl CommandSpec {
    fn with_invocation(invocation: Invocation) -> Self {
        Self {
            invocation,
            interpreter: Interpreter::default(),
            cwd: None,
            env_clear: false,
            env: Vec::new(),
            stdout: StdioMode::Piped,
            stderr: StdioMode::Inherit,
            line_buffer: DEFAULT_LINE_BUFFER,
            timeout: None,
        }
    }

    /// Run `command` through the command interpreter.
    pub fn shell(command: impl Into<String>) -> Self {
        Self::with_invocation(Invocation::Shell(command.into()))
    }

    /// Execute `program` directly with no interpreter.
    pub fn exec(program: impl Into<String>) -> Self {
        Self::with_invocation(Invocation::Exec {
            program: program.into(),
            args: Vec::new(),
        })
    }

    /// Append an argument. Ignored for shell-mode commands, whose arguments
    /// are part of the command text.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if let Invocation::Exec { args, .. } = &mut self.invocation {
            args.push(arg.into());
        }
        self
    }

    pub fn args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Invocation::Exec { args, .. } = &mut self.invocation {
            args.extend(extra.into_iter().map(Into::into));
        }
        self
    }

    pub fn interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push(EnvChange::Set(key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.env.push(EnvChange::Remove(key.into()));
        self
    }

    /// Start from an empty environment; later `env` calls still apply.
    pub fn env_clear(mut self) -> Self {
        self.env_clear = true;
        self.env.clear();
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    /// Lines held between an output pipe and its consumer before the reader
    /// stops pulling from the pipe. Clamped to at least 1.
    pub fn line_buffer(mut self, lines: usize) -> Self {
        self.line_buffer = lines.max(1);
        self
    }

    /// Kill the process if it is still running after `limit`.
    ///
    /// Past the limit, output pipes held open after the process has exited
    /// are abandoned as well, as with
    /// [`RunningProcess::kill`](crate::exec::RunningProcess::kill).
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Apply interpreter, buffering, timeout and stderr defaults from `cfg`.
    ///
    /// A timeout already set on the spec wins over the configured default.
    pub fn configured(mut self, cfg: &Config) -> Self {
        self.interpreter = cfg.interpreter.clone();
        self.line_buffer = cfg.line_buffer;
        if self.timeout.is_none() {
            self.timeout = cfg.timeout;
        }
        if cfg.capture_stderr && self.stderr == StdioMode::Inherit {
            self.stderr = StdioMode::Piped;
        }
        self
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn stdout_mode(&self) -> StdioMode {
        self.stdout
    }

    pub fn stderr_mode(&self) -> StdioMode {
        self.stderr
    }

    pub fn buffer_lines(&self) -> usize {
        self.line_buffer
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Human-readable command text, used in logs and error messages.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Build the `tokio` command. Stdin is always piped; the engine feeds it.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = match &self.invocation {
            Invocation::Shell(text) => {
                let mut c = Command::new(&self.interpreter.program);
                c.arg(&self.interpreter.flag).arg(text);
                c
            }
            Invocation::Exec { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
        };

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        if self.env_clear {
            cmd.env_clear();
        }
        for change in &self.env {
            match change {
                EnvChange::Set(k, v) => {
                    cmd.env(k, v);
                }
                EnvChange::Remove(k) => {
                    cmd.env_remove(k);
                }
            }
        }

        cmd.stdin(Stdio::piped())
            .stdout(self.stdout.to_stdio())
            .stderr(self.stderr.to_stdio())
            .kill_on_drop(true);

        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.invocation {
            Invocation::Shell(text) => write!(f, "{text}"),
            Invocation::Exec { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, " {arg:?}")?;
                    } else {
                        write!(f, " {arg}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
