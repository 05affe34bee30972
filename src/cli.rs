// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `shellpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shellpipe",
    version,
    about = "Run a command with a line stream as stdin and stream its stdout back.",
    long_about = None
)]
#[command(group(ArgGroup::new("source").args(["input", "line", "stdin"])))]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$SHELLPIPE_CONFIG`, then `Shellpipe.toml` if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHELLPIPE_LOG`, the config file, or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Feed the lines of this file to the command's stdin.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Feed this line to the command's stdin (repeatable).
    #[arg(long, value_name = "TEXT")]
    pub line: Vec<String>,

    /// Forward this process's own stdin to the command.
    #[arg(long)]
    pub stdin: bool,

    /// Execute the first word as a program instead of going through the shell.
    #[arg(long)]
    pub exec: bool,

    /// Kill the command after this long (e.g. `500ms`, `10s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Pipe the command's stderr through this process instead of sharing it.
    #[arg(long)]
    pub capture_stderr: bool,

    /// Treat a non-zero exit as an error.
    #[arg(long)]
    pub strict: bool,

    /// Print the resolved invocation without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// The command. In shell mode the words are joined with spaces.
    #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_trailing_command() {
        let args = CliArgs::try_parse_from([
            "shellpipe", "--line", "a", "--line", "b", "--timeout", "2s", "--", "grep", "-v", "a",
        ])
        .unwrap();
        assert_eq!(args.line, vec!["a", "b"]);
        assert_eq!(args.timeout, Some(Duration::from_secs(2)));
        assert_eq!(args.command, vec!["grep", "-v", "a"]);
    }

    #[test]
    fn input_sources_are_exclusive() {
        let res = CliArgs::try_parse_from(["shellpipe", "--stdin", "--line", "x", "cat"]);
        assert!(res.is_err());
    }

    #[test]
    fn command_is_required() {
        assert!(CliArgs::try_parse_from(["shellpipe", "--strict"]).is_err());
    }
}
