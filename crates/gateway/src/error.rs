//! Error types for the gateway crate

use meridian_core::{CorrelationId, SubscriptionListError};
use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    #[error("Frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session-level errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed { addr: String, reason: String },

    #[error("Service {service} unavailable: {reason}")]
    ServiceUnavailable { service: String, reason: String },

    #[error("Invalid request: {0}")]
    RequestInvalid(String),

    #[error("Correlation id {0} is already in use")]
    DuplicateCorrelationId(CorrelationId),

    #[error("Invalid subscription: {0}")]
    Subscription(#[from] SubscriptionListError),

    #[error("Session terminated")]
    SessionTerminated,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Errors after which the session cannot be used any further
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::SessionTerminated | Self::Transport(_)
        )
    }
}

impl TransportError {
    /// The other end is gone: closed channel, or a reset or broken socket
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ChannelClosed => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

impl From<bincode::Error> for TransportError {
    fn from(e: bincode::Error) -> Self {
        TransportError::Serialization(e.to_string())
    }
}
