//! Reading a config file, or the per-user default one.

use std::io;
use std::path::Path;

use parley_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::ParleyConfig;
use crate::validation;

/// Parse the TOML file at `path`, filling gaps from serde defaults.
///
/// A missing file is [`ConfigError::FileNotFound`]. Out-of-range values
/// only produce a warning; the parsed config is still returned.
pub fn load_from_path(path: &Path) -> Result<ParleyConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config: ParleyConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if let Err(e) = validation::validate(&config) {
        warn!(error = %e, "Config has invalid values, using it anyway");
    }
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load the per-user config, writing the template on first run.
pub fn load_default() -> Result<ParleyConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(ParleyConfig::default())
        }
        other => other,
    }
}
