// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only spawn failures and unrecoverable I/O surface here. Non-zero exits and
//! signal terminations are ordinary [`ExitStatus`] data, except when a caller
//! opts into the strict helpers, which turn them into
//! [`ShellError::CommandFailed`].

use thiserror::Error;

use crate::status::ExitStatus;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("input stream failed while feeding stdin: {0}")]
    Input(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShellError {
    /// Exit status carried by a strict-mode failure, if any.
    pub fn status(&self) -> Option<ExitStatus> {
        match self {
            ShellError::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShellError>;
