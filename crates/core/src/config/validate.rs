use super::{
    types::{BootstrapConfig, DeviceConfig},
    ConfigError,
};

/// Validate device settings
/// Currently validates:
/// - Frame rate and request timeout are non-zero
/// - Readiness backoff bounds are ordered
/// - At least one failed poll is tolerated
pub fn validate_config(config: &DeviceConfig) -> Result<(), ConfigError> {
    if config.playback.frame_rate == 0 {
        return Err(ConfigError::ValidationError(
            "playback.frame_rate cannot be 0".to_string(),
        ));
    }

    if config.network.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "network.timeout_secs cannot be 0".to_string(),
        ));
    }

    let readiness = &config.readiness;
    if readiness.backoff_initial_ms > readiness.backoff_max_ms {
        return Err(ConfigError::ValidationError(format!(
            "readiness.backoff_initial_ms ({}) exceeds readiness.backoff_max_ms ({})",
            readiness.backoff_initial_ms, readiness.backoff_max_ms
        )));
    }

    if readiness.max_consecutive_failures == 0 {
        return Err(ConfigError::ValidationError(
            "readiness.max_consecutive_failures cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate the bootstrap descriptor has somewhere to connect to.
pub fn validate_bootstrap(bootstrap: &BootstrapConfig) -> Result<(), ConfigError> {
    if bootstrap.server_ip.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "bootstrap serverIp is empty".to_string(),
        ));
    }

    if bootstrap.port.trim().parse::<u16>().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap port is not a valid port: {:?}",
            bootstrap.port
        )));
    }

    Ok(())
}
