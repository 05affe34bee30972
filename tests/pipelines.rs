#![cfg(unix)]

use std::error::Error;
use std::time::Duration;

use shellpipe::{
    inshell, pipeline, spawn, CommandSpec, ExitStatus, LineStream, Shell, ShellError, StdioMode,
};
use shellpipe_test_utils::init_tracing;
use shellpipe_test_utils::lines::numbered_lines;
use shellpipe_test_utils::timing::within;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn stdout_of_one_process_feeds_the_next() -> TestResult {
    init_tracing();

    let mut upper = inshell("tr a-z A-Z", LineStream::from_lines(["b", "a", "c"]))?;
    let mut sort = spawn(
        &CommandSpec::shell("sort -r"),
        upper.take_stdout().unwrap_or_default(),
    )?;

    let lines = sort.take_stdout().unwrap_or_default().collect_lines().await?;
    assert_eq!(lines, vec!["C", "B", "A"]);
    assert_eq!(upper.wait().await?, ExitStatus::Succeeded);
    assert_eq!(sort.wait().await?, ExitStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn pipeline_reports_every_stage() -> TestResult {
    init_tracing();

    let specs = [
        CommandSpec::shell("sort"),
        CommandSpec::shell("uniq"),
        CommandSpec::shell("cat; exit 3"),
    ];
    let mut pipe = pipeline(&specs, LineStream::from_lines(["b", "a", "b", "c", "a"]))?;
    assert_eq!(pipe.len(), 3);

    let lines = pipe.take_stdout().unwrap_or_default().collect_lines().await?;
    assert_eq!(lines, vec!["a", "b", "c"]);

    let statuses = within(Duration::from_secs(10), "pipeline", pipe.wait()).await??;
    assert_eq!(
        statuses,
        vec![
            ExitStatus::Succeeded,
            ExitStatus::Succeeded,
            ExitStatus::FailedWithCode(3)
        ]
    );
    Ok(())
}

#[tokio::test]
async fn shell_pipeline_output_uses_last_status() -> TestResult {
    init_tracing();

    let shell = Shell::default();
    let out = shell
        .pipeline(&["cat", "grep -v 3", "wc -l"], LineStream::from_lines(numbered_lines(10)))?
        .output()
        .await?;

    assert_eq!(out.stdout.iter().map(|l| l.trim()).collect::<Vec<_>>(), vec!["9"]);
    assert_eq!(out.status, ExitStatus::Succeeded);
    Ok(())
}

#[tokio::test]
async fn pipeline_collects_stage_stderr() -> TestResult {
    init_tracing();

    let specs = [
        CommandSpec::shell("echo first >&2; cat").stderr(StdioMode::Piped),
        CommandSpec::shell("echo second >&2; cat").stderr(StdioMode::Piped),
    ];
    let out = pipeline(&specs, LineStream::from_lines(["x"]))?.output().await?;

    assert_eq!(out.stdout, vec!["x"]);
    assert_eq!(out.stderr, vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn spawn_failure_midway_is_reported() {
    init_tracing();

    let specs = [
        CommandSpec::shell("cat"),
        CommandSpec::exec("shellpipe-no-such-stage"),
    ];

    match pipeline(&specs, LineStream::from_lines(["x"])) {
        Err(ShellError::Spawn { command, .. }) => assert_eq!(command, "shellpipe-no-such-stage"),
        other => panic!("expected spawn error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_pipeline_is_rejected() {
    init_tracing();
    assert!(pipeline(&[], LineStream::empty()).is_err());
}
