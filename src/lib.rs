// src/lib.rs

//! Typed shell-command execution with lazily streamed line I/O.
//!
//! ```no_run
//! use shellpipe::{inshell, LineStream, ExitStatus};
//!
//! # async fn demo() -> shellpipe::ShellResult<()> {
//! let mut sort = inshell("sort", LineStream::from_lines(["b", "a"]))?;
//! let lines = sort.take_stdout().unwrap_or_default().collect_lines().await?;
//! assert_eq!(lines, ["a", "b"]);
//! assert_eq!(sort.wait().await?, ExitStatus::Succeeded);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod shell;
pub mod status;
pub mod stream;

use anyhow::{Context, Result};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

pub use crate::errors::{Result as ShellResult, ShellError};
pub use crate::exec::{
    pipeline, spawn, CommandSpec, Interpreter, Invocation, Output, Pipeline, RunningProcess,
    StdioMode,
};
pub use crate::shell::{inproc, inshell, output, proc, proc_strict, system, system_strict, Shell};
pub use crate::status::{ensure_success, ExitStatus};
pub use crate::stream::LineStream;

use crate::cli::CliArgs;
use crate::config::Config;

/// High-level entry point used by `main.rs`.
///
/// Builds the command from the arguments, feeds it the selected input,
/// copies its stdout to ours and returns the exit code to terminate with.
pub async fn run(args: CliArgs, cfg: Config) -> Result<i32> {
    let spec = build_spec(&args, &cfg);

    if args.dry_run {
        print_dry_run(&spec, &args);
        return Ok(0);
    }

    let input = input_stream(&args).await?;
    let command = spec.display();

    let mut process = spawn(&spec, input)?;
    info!(cmd = %command, pid = ?process.pid(), "running");

    let stderr_task = process
        .take_stderr()
        .map(|stream| tokio::spawn(forward_stderr(stream, command.clone())));

    let mut written = 0u64;
    if let Some(mut stdout) = process.take_stdout() {
        let mut out = BufWriter::new(tokio::io::stdout());
        while let Some(line) = stdout.next_line().await? {
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            written += 1;
        }
        out.flush().await?;
    }

    if let Some(task) = stderr_task {
        task.await.context("joining stderr forwarder")?;
    }

    let status = process.wait().await?;
    debug!(cmd = %command, %status, lines = written, "finished");

    if args.strict {
        status.check(&command)?;
    }

    Ok(status.exit_code())
}

/// Copy a child's stderr to ours. Returns the number of lines forwarded.
async fn forward_stderr(mut stream: LineStream, command: String) -> u64 {
    let mut forwarded = 0u64;
    loop {
        match stream.next_line().await {
            Ok(Some(line)) => {
                eprintln!("{line}");
                forwarded += 1;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(cmd = %command, error = %e, lines = forwarded, "reading stderr failed");
                break;
            }
        }
    }
    forwarded
}

fn build_spec(args: &CliArgs, cfg: &Config) -> CommandSpec {
    let spec = match (args.exec, args.command.split_first()) {
        (true, Some((program, rest))) => CommandSpec::exec(program.clone()).args(rest.iter().cloned()),
        _ => CommandSpec::shell(args.command.join(" ")),
    };

    let mut spec = spec.configured(cfg).stdout(StdioMode::Piped);

    if let Some(limit) = args.timeout {
        spec = spec.timeout(limit);
    }
    if args.capture_stderr {
        spec = spec.stderr(StdioMode::Piped);
    }
    spec
}

async fn input_stream(args: &CliArgs) -> Result<LineStream> {
    if let Some(path) = &args.input {
        let stream = LineStream::from_file(path)
            .await
            .with_context(|| format!("opening input file {}", path.display()))?;
        return Ok(stream);
    }
    if !args.line.is_empty() {
        return Ok(LineStream::from_lines(args.line.iter().cloned()));
    }
    if args.stdin {
        return Ok(LineStream::from_reader(tokio::io::stdin()));
    }
    Ok(LineStream::empty())
}

fn print_dry_run(spec: &CommandSpec, args: &CliArgs) {
    println!("shellpipe dry-run");
    match spec.invocation() {
        Invocation::Shell(text) => println!("  shell: {text}"),
        Invocation::Exec { program, args } => {
            println!("  exec: {program}");
            if !args.is_empty() {
                println!("  args: {args:?}");
            }
        }
    }
    println!("  stdout: {:?}", spec.stdout_mode());
    println!("  stderr: {:?}", spec.stderr_mode());
    println!("  line_buffer: {}", spec.buffer_lines());
    if let Some(limit) = spec.time_limit() {
        println!("  timeout: {limit:?}");
    }
    if let Some(path) = &args.input {
        println!("  input: {}", path.display());
    } else if !args.line.is_empty() {
        println!("  input: {} line(s)", args.line.len());
    } else if args.stdin {
        println!("  input: <stdin>");
    }

    debug!("dry-run complete (no execution)");
}
