pub mod loader;
pub mod types;

pub use loader::{
    CONFIG_ENV_VAR, ConfigError, load_config, load_config_from_env, load_config_from_str,
    load_default_config,
};
pub use types::{GatewayConfigFile, SessionOptions};
