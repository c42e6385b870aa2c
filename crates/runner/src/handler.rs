//! Event handler callbacks

use log::{debug, info};
use meridian_core::{EventType, Message, WalkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Malformed message: {0}")]
    Walk(#[from] WalkError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Receives every message the dispatch loop reads, one call per message.
///
/// An error is logged by the loop and does not stop it.
pub trait EventHandler {
    /// A response message; `is_final` on the last event of the request
    fn on_response(&mut self, message: &Message, is_final: bool) -> Result<(), HandlerError>;

    fn on_subscription_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        debug!("Unhandled subscription data {}", message.message_type);
        Ok(())
    }

    fn on_subscription_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        info!(
            "Subscription status {} for {:?}",
            message.message_type, message.correlation_ids
        );
        Ok(())
    }

    fn on_session_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        info!("Session status {}", message.message_type);
        Ok(())
    }

    /// Service status and miscellaneous events
    fn on_other(&mut self, event_type: EventType, message: &Message) -> Result<(), HandlerError> {
        debug!("Ignoring {} {}", event_type.as_str(), message.message_type);
        Ok(())
    }
}

impl<H: EventHandler + ?Sized> EventHandler for Box<H> {
    fn on_response(&mut self, message: &Message, is_final: bool) -> Result<(), HandlerError> {
        (**self).on_response(message, is_final)
    }

    fn on_subscription_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        (**self).on_subscription_data(message)
    }

    fn on_subscription_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        (**self).on_subscription_status(message)
    }

    fn on_session_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        (**self).on_session_status(message)
    }

    fn on_other(&mut self, event_type: EventType, message: &Message) -> Result<(), HandlerError> {
        (**self).on_other(event_type, message)
    }
}
