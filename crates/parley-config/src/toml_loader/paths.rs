//! Where the config file lives, and writing the first-run template.

use std::fs;
use std::path::{Path, PathBuf};

use parley_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "parley";
const FILE_NAME: &str = "config.toml";

/// `<config dir>/parley/config.toml` for the current platform.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_failed = |what: &str, e: std::io::Error| {
        ConfigError::ParseError(format!("{what} {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_failed("cannot create directory for", e))?;
    }
    fs::write(path, default_config_toml()).map_err(|e| write_failed("cannot write", e))?;

    info!(path = %path.display(), "Wrote default config");
    Ok(())
}
