// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the raw `serde` mapping of `Shellpipe.toml` and the
//!   validated [`Config`].
//! - [`loader`] reads the file from disk.
//! - [`validate`] turns a [`RawConfigFile`] into a [`Config`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{Config, DefaultsSection, PipesSection, RawConfigFile, ShellSection};
pub use validate::parse_duration;
