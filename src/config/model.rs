// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::exec::command::{Interpreter, DEFAULT_LINE_BUFFER};

/// Configuration as read from a TOML file.
///
/// ```toml
/// [shell]
/// program = "bash"
/// flag = "-c"
///
/// [pipes]
/// line_buffer = 64
///
/// [defaults]
/// timeout = "30s"
/// capture_stderr = false
/// log_level = "info"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub shell: ShellSection,

    #[serde(default)]
    pub pipes: PipesSection,

    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// `[shell]` section: the command interpreter for shell-mode commands.
///
/// Unset keys fall back to `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellSection {
    pub program: Option<String>,
    pub flag: Option<String>,
}

/// `[pipes]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipesSection {
    /// Lines buffered between an output pipe and its consumer.
    #[serde(default = "default_line_buffer")]
    pub line_buffer: usize,
}

fn default_line_buffer() -> usize {
    DEFAULT_LINE_BUFFER
}

impl Default for PipesSection {
    fn default() -> Self {
        Self {
            line_buffer: default_line_buffer(),
        }
    }
}

/// `[defaults]` section: per-command defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    /// Duration string such as `"250ms"`, `"30s"`, `"5m"`.
    pub timeout: Option<String>,

    #[serde(default)]
    pub capture_stderr: bool,

    /// error, warn, info, debug or trace.
    pub log_level: Option<String>,
}

/// Validated configuration used by the rest of the crate.
///
/// Built from a [`RawConfigFile`] via `TryFrom` (see
/// [`validate`](crate::config::validate)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interpreter: Interpreter,
    pub line_buffer: usize,
    pub timeout: Option<Duration>,
    pub capture_stderr: bool,
    pub log_level: Option<tracing::Level>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: Interpreter::default(),
            line_buffer: DEFAULT_LINE_BUFFER,
            timeout: None,
            capture_stderr: false,
            log_level: None,
        }
    }
}
