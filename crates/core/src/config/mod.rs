mod loader;
mod types;
mod validate;

pub use loader::{load_bootstrap, load_device_config, load_device_config_from_str};
pub use types::*;
pub use validate::{validate_bootstrap, validate_config};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The local bootstrap descriptor or settings file is absent or unreadable.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
