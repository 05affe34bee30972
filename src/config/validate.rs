// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{Config, RawConfigFile};
use crate::errors::{Result, ShellError};
use crate::exec::command::Interpreter;
use crate::logging::parse_level_str;

impl TryFrom<RawConfigFile> for Config {
    type Error = ShellError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interpreter = validate_shell(&raw)?;
        validate_pipes(&raw)?;

        let timeout = raw
            .defaults
            .timeout
            .as_deref()
            .map(|s| {
                parse_duration(s).map_err(|e| {
                    ShellError::ConfigError(format!("[defaults].timeout: {e}"))
                })
            })
            .transpose()?;

        let log_level = raw
            .defaults
            .log_level
            .as_deref()
            .map(|s| {
                parse_level_str(s).ok_or_else(|| {
                    ShellError::ConfigError(format!(
                        "[defaults].log_level: unknown level '{s}' (expected error, warn, info, debug or trace)"
                    ))
                })
            })
            .transpose()?;

        Ok(Config {
            interpreter,
            line_buffer: raw.pipes.line_buffer,
            timeout,
            capture_stderr: raw.defaults.capture_stderr,
            log_level,
        })
    }
}

fn validate_shell(cfg: &RawConfigFile) -> Result<Interpreter> {
    let fallback = Interpreter::default();

    let program = match cfg.shell.program.as_deref() {
        Some(p) if p.trim().is_empty() => {
            return Err(ShellError::ConfigError(
                "[shell].program must not be empty".to_string(),
            ));
        }
        Some(p) => p.to_string(),
        None => fallback.program,
    };

    let flag = cfg.shell.flag.clone().unwrap_or(fallback.flag);

    Ok(Interpreter::new(program, flag))
}

fn validate_pipes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipes.line_buffer == 0 {
        return Err(ShellError::ConfigError(
            "[pipes].line_buffer must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn empty_raw_config_gives_defaults() {
        let cfg = Config::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn rejects_zero_line_buffer() {
        let mut raw = RawConfigFile::default();
        raw.pipes.line_buffer = 0;
        let err = Config::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("line_buffer"));
    }

    #[test]
    fn rejects_bad_log_level_and_timeout() {
        let mut raw = RawConfigFile::default();
        raw.defaults.log_level = Some("loud".into());
        assert!(Config::try_from(raw).is_err());

        let mut raw = RawConfigFile::default();
        raw.defaults.timeout = Some("soon".into());
        assert!(Config::try_from(raw).is_err());
    }

    #[test]
    fn blank_program_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.shell.program = Some("  ".into());
        assert!(Config::try_from(raw).is_err());
    }
}
