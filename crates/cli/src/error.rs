use meridian_gateway::{ConfigError, SessionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    Args(#[from] clap::Error),

    #[error("Invalid date {0}, expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid option {0}, expected NAME=VALUE")]
    InvalidOption(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Interrupted before the final response")]
    Interrupted,

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
