use super::{types::Config, ConfigError};
use crate::download::HeaderPolicy;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Poll interval and concurrency cap are not 0
/// - Header rule patterns compile
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Downloads validation
    if config.downloads.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "downloads.poll_interval_ms cannot be 0".to_string(),
        ));
    }
    if config.downloads.max_concurrent == Some(0) {
        return Err(ConfigError::ValidationError(
            "downloads.max_concurrent cannot be 0".to_string(),
        ));
    }

    HeaderPolicy::new(&config.header_rules)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}
