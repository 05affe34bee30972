// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SHELLPIPE_LOG` environment variable (e.g. "info", "debug")
//! 3. `[defaults].log_level` from the config file
//! 4. default to `warn`
//!
//! Logs go to STDERR; stdout carries command output only.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SHELLPIPE_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, config_level: Option<tracing::Level>) -> Result<()> {
    let level = resolve_level(
        cli_level,
        std::env::var(LOG_ENV).ok().as_deref(),
        config_level,
    );

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

fn resolve_level(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
    config_level: Option<tracing::Level>,
) -> tracing::Level {
    cli_level
        .map(level_from_log_level)
        .or_else(|| env_value.and_then(parse_level_str))
        .or(config_level)
        .unwrap_or(tracing::Level::WARN)
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn cli_flag_beats_env_and_config() {
        let lvl = resolve_level(Some(LogLevel::Debug), Some("error"), Some(Level::INFO));
        assert_eq!(lvl, Level::DEBUG);
    }

    #[test]
    fn env_beats_config_unless_unparseable() {
        assert_eq!(resolve_level(None, Some("trace"), Some(Level::INFO)), Level::TRACE);
        assert_eq!(resolve_level(None, Some("nonsense"), Some(Level::INFO)), Level::INFO);
        assert_eq!(resolve_level(None, None, None), Level::WARN);
    }
}
