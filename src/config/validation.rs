//! Configuration validation.
//!
//! Returns every problem found, not just the first.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::BootstrapConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no listeners configured")]
    NoListeners,

    #[error("listener '{name}' has port 0")]
    ZeroPort { name: String },

    #[error("port {port} is used by more than one listener")]
    DuplicatePort { port: u16 },

    #[error("listener name '{name}' is used more than once")]
    DuplicateName { name: String },

    #[error("unknown log level '{level}'")]
    UnknownLogLevel { level: String },
}

/// Semantic checks on a parsed configuration.
pub fn validate_config(config: &BootstrapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel {
            level: config.log_level.clone(),
        });
    }

    if config.listeners.is_empty() {
        errors.push(ValidationError::NoListeners);
    }

    let mut ports = HashSet::new();
    let mut names = HashSet::new();
    for listener in &config.listeners {
        if listener.port == 0 {
            errors.push(ValidationError::ZeroPort {
                name: listener.name.clone(),
            });
        } else if !ports.insert(listener.port) {
            errors.push(ValidationError::DuplicatePort { port: listener.port });
        }
        if !names.insert(listener.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                name: listener.name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
