use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

use super::{
    types::{BootstrapConfig, DeviceConfig},
    ConfigError,
};

/// Load device settings from file with environment variable overrides
pub fn load_device_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigMissing(path.display().to_string()));
    }

    let config: DeviceConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("HOLOSYNC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load device settings from TOML string (useful for testing)
pub fn load_device_config_from_str(toml_str: &str) -> Result<DeviceConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load the local bootstrap descriptor.
///
/// `HOLOSYNC_BOOTSTRAP_SERVERIP` and `HOLOSYNC_BOOTSTRAP_PORT` override the
/// file contents. An unreadable file is reported as missing: the experience
/// cannot start without it either way.
pub fn load_bootstrap(path: &Path) -> Result<BootstrapConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigMissing(path.display().to_string()));
    }

    Figment::new()
        .merge(Json::file(path))
        .merge(Env::prefixed("HOLOSYNC_BOOTSTRAP_"))
        .extract()
        .map_err(|e| ConfigError::ConfigMissing(format!("{}: {}", path.display(), e)))
}
