// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Config, RawConfigFile};
use crate::errors::Result;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SHELLPIPE_CONFIG";

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Read, deserialize and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// Resolve and load the configuration.
///
/// - An explicit path must exist and be valid.
/// - Otherwise `SHELLPIPE_CONFIG`, then `Shellpipe.toml` in the current
///   directory, are used if the file exists.
/// - With no file at all, [`Config::default`] applies.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading config");
        load_and_validate(&path)
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        Ok(Config::default())
    }
}

/// `SHELLPIPE_CONFIG` if set, else `Shellpipe.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Shellpipe.toml"))
}
