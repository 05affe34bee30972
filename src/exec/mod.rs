// src/exec/mod.rs

//! Process execution layer.
//!
//! Commands are started with `tokio::process::Command`; their standard
//! streams are bridged to [`LineStream`](crate::stream::LineStream)s.
//!
//! - [`command`] describes a process to start ([`CommandSpec`]).
//! - [`engine`] spawns it and runs the feeder/reader/supervisor tasks.
//! - [`process`] is the caller's handle on a running process.
//! - [`pipeline`] chains several processes stdout-to-stdin.

pub mod command;
pub mod engine;
pub mod pipeline;
pub mod process;

pub use command::{CommandSpec, Interpreter, Invocation, StdioMode, DEFAULT_LINE_BUFFER};
pub use engine::spawn;
pub use pipeline::{pipeline, Pipeline};
pub use process::{Output, RunningProcess};
