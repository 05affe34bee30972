use std::error::Error;
use std::io::Write;
use std::time::Duration;

use shellpipe::config::{load_and_validate, load_or_default, Config};
use shellpipe::{CommandSpec, Interpreter, ShellError, StdioMode};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<tempfile::NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn full_config_is_applied() -> TestResult {
    let file = write_config(
        r#"
[shell]
program = "bash"
flag = "-lc"

[pipes]
line_buffer = 4

[defaults]
timeout = "1500ms"
capture_stderr = true
log_level = "debug"
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.interpreter, Interpreter::new("bash", "-lc"));
    assert_eq!(cfg.line_buffer, 4);
    assert_eq!(cfg.timeout, Some(Duration::from_millis(1500)));
    assert!(cfg.capture_stderr);
    assert_eq!(cfg.log_level, Some(tracing::Level::DEBUG));

    let spec = CommandSpec::shell("true").configured(&cfg);
    assert_eq!(spec.buffer_lines(), 4);
    assert_eq!(spec.time_limit(), Some(Duration::from_millis(1500)));
    assert_eq!(spec.stderr_mode(), StdioMode::Piped);
    Ok(())
}

#[test]
fn partial_config_keeps_defaults() -> TestResult {
    let file = write_config("[pipes]\nline_buffer = 2\n")?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(
        cfg,
        Config {
            line_buffer: 2,
            ..Config::default()
        }
    );
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let file = write_config("[pipes]\nline_bufer = 2\n")?;
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, ShellError::TomlError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn semantic_errors_are_config_errors() -> TestResult {
    let file = write_config("[defaults]\ntimeout = \"forever\"\n")?;
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, ShellError::ConfigError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let res = load_or_default(Some(missing.as_path()));
    assert!(matches!(res, Err(ShellError::Io(_))));
}
