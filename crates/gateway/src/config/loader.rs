use std::path::Path;
use thiserror::Error;

use super::types::GatewayConfigFile;

/// Environment variable naming a configuration file to use instead of the default
pub const CONFIG_ENV_VAR: &str = "MERIDIAN_GATEWAY_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load gateway configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<GatewayConfigFile, ConfigError> {
    let config: GatewayConfigFile = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<GatewayConfigFile, ConfigError> {
    let default_config = include_str!("gateway_config.json");
    load_config_from_str(default_config)
}

/// Load the file named by `MERIDIAN_GATEWAY_CONFIG`, or the embedded default
pub fn load_config_from_env() -> Result<GatewayConfigFile, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => {
            log::debug!("Loading gateway config from {:?}", path);
            load_config(path)
        }
        None => load_default_config(),
    }
}

impl GatewayConfigFile {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host is empty".to_string()));
        }
        if self.default_port == 0 || self.historical_data_port == 0 {
            return Err(ConfigError::Invalid("port 0 is not allowed".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
