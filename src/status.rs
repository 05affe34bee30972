// src/status.rs

//! Typed exit status of a terminated process.

use std::fmt;

use crate::errors::{Result, ShellError};

/// Outcome of a process that ran to termination.
///
/// Produced exactly once per spawned process. A process that could not be
/// started never yields one of these; see [`ShellError::Spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Succeeded,
    /// Exited on its own with a non-zero code.
    FailedWithCode(i32),
    /// Terminated by the given signal number.
    KilledBySignal(i32),
}

impl ExitStatus {
    /// Build from a raw exit code. `0` maps to [`ExitStatus::Succeeded`].
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            ExitStatus::Succeeded
        } else {
            ExitStatus::FailedWithCode(code)
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Succeeded)
    }

    /// Exit code, if the process exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Succeeded => Some(0),
            ExitStatus::FailedWithCode(n) => Some(*n),
            ExitStatus::KilledBySignal(_) => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            ExitStatus::KilledBySignal(s) => Some(*s),
            _ => None,
        }
    }

    /// Code a front-end should exit with to mirror this status, following the
    /// usual shell convention of `128 + signal` for signal deaths.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitStatus::Succeeded => 0,
            ExitStatus::FailedWithCode(n) => *n,
            ExitStatus::KilledBySignal(s) => 128 + s,
        }
    }

    /// Turn a non-success status into [`ShellError::CommandFailed`] naming
    /// `command`.
    pub fn check(self, command: impl Into<String>) -> Result<()> {
        if self.success() {
            Ok(())
        } else {
            Err(ShellError::CommandFailed {
                command: command.into(),
                status: self,
            })
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Succeeded => write!(f, "succeeded"),
            ExitStatus::FailedWithCode(n) => write!(f, "failed with exit code {n}"),
            ExitStatus::KilledBySignal(s) => write!(f, "was killed by signal {s}"),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitStatus::from_code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ExitStatus::KilledBySignal(sig);
            }
        }

        // Neither a code nor a signal: treat as a generic failure.
        ExitStatus::FailedWithCode(-1)
    }
}

/// Free-function form of [`ExitStatus::check`].
pub fn ensure_success(command: &str, status: ExitStatus) -> Result<()> {
    status.check(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_code_is_success() {
        assert_eq!(ExitStatus::from_code(0), ExitStatus::Succeeded);
        assert_eq!(ExitStatus::from_code(3), ExitStatus::FailedWithCode(3));
    }

    #[test]
    fn exit_code_follows_shell_convention() {
        assert_eq!(ExitStatus::Succeeded.exit_code(), 0);
        assert_eq!(ExitStatus::FailedWithCode(42).exit_code(), 42);
        assert_eq!(ExitStatus::KilledBySignal(9).exit_code(), 137);
        assert_eq!(ExitStatus::KilledBySignal(9).code(), None);
        assert_eq!(ExitStatus::KilledBySignal(9).signal(), Some(9));
    }

    #[test]
    fn check_names_the_command() {
        let err = ExitStatus::FailedWithCode(2)
            .check("grep foo bar.txt")
            .unwrap_err();
        assert_eq!(err.status(), Some(ExitStatus::FailedWithCode(2)));
        assert_eq!(
            err.to_string(),
            "command `grep foo bar.txt` failed with exit code 2"
        );
        assert!(ensure_success("true", ExitStatus::Succeeded).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn converts_std_status() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code lives in the high byte, signal in the low bits.
        let exited = std::process::ExitStatus::from_raw(7 << 8);
        assert_eq!(ExitStatus::from(exited), ExitStatus::FailedWithCode(7));

        let signalled = std::process::ExitStatus::from_raw(15);
        assert_eq!(ExitStatus::from(signalled), ExitStatus::KilledBySignal(15));

        let ok = std::process::ExitStatus::from_raw(0);
        assert_eq!(ExitStatus::from(ok), ExitStatus::Succeeded);
    }
}
