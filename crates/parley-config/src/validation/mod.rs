//! Full configuration validation.
//!
//! Validates numeric ranges and required strings. Each section has its own
//! check; this orchestrator calls them all and collects errors into a
//! single `ConfigError`.

mod helpers;
mod misc;


use crate::schema::ParleyConfig;
use parley_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParleyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    misc::validate_endpoint(&mut errors, config);
    misc::validate_retry(&mut errors, config);
    misc::validate_persistence(&mut errors, config);
    misc::validate_voice(&mut errors, config);
    misc::validate_messages(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
