//! Routing subscription traffic by correlation id

use crate::handler::{EventHandler, HandlerError};
use log::{debug, warn};
use meridian_core::{CorrelationId, Message};
use std::collections::HashMap;

/// Handles the stream of one subscription
pub trait SubscriptionHandler {
    fn on_data(&mut self, message: &Message) -> Result<(), HandlerError>;

    fn on_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        debug!("Status {} ignored", message.message_type);
        Ok(())
    }
}

/// Sends each subscription message to the handler registered for its correlation id
#[derive(Default)]
pub struct SubscriptionRouter {
    handlers: HashMap<CorrelationId, Box<dyn SubscriptionHandler>>,
    /// Messages whose correlation id had no handler
    dropped: u64,
}

impl SubscriptionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `id`, replacing any previous one
    pub fn register(&mut self, id: CorrelationId, handler: Box<dyn SubscriptionHandler>) {
        self.handlers.insert(id, handler);
    }

    pub fn remove(&mut self, id: CorrelationId) -> Option<Box<dyn SubscriptionHandler>> {
        self.handlers.remove(&id)
    }

    pub fn contains(&self, id: CorrelationId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn route<F>(&mut self, message: &Message, mut deliver: F) -> Result<(), HandlerError>
    where
        F: FnMut(&mut Box<dyn SubscriptionHandler>, &Message) -> Result<(), HandlerError>,
    {
        let mut delivered = false;
        for id in &message.correlation_ids {
            if let Some(handler) = self.handlers.get_mut(id) {
                deliver(handler, message)?;
                delivered = true;
            }
        }
        if !delivered {
            warn!(
                "Dropping {} for unknown correlation ids {:?}",
                message.message_type, message.correlation_ids
            );
            self.dropped += 1;
        }
        Ok(())
    }
}

impl EventHandler for SubscriptionRouter {
    fn on_response(&mut self, message: &Message, _is_final: bool) -> Result<(), HandlerError> {
        debug!("Router ignoring response {}", message.message_type);
        Ok(())
    }

    fn on_subscription_data(&mut self, message: &Message) -> Result<(), HandlerError> {
        self.route(message, |handler, message| handler.on_data(message))
    }

    fn on_subscription_status(&mut self, message: &Message) -> Result<(), HandlerError> {
        self.route(message, |handler, message| handler.on_status(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Element;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SubscriptionHandler for Recorder {
        fn on_data(&mut self, message: &Message) -> Result<(), HandlerError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, message.message_type));
            Ok(())
        }
    }

    fn message(id: u64, message_type: &str) -> Message {
        Message::new(message_type, Element::complex(message_type, vec![]))
            .with_correlation_id(CorrelationId::new(id))
    }

    #[test]
    fn test_routes_by_token() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = SubscriptionRouter::new();
        router.register(
            CorrelationId::new(1),
            Box::new(Recorder { name: "one", log: log.clone() }),
        );
        router.register(
            CorrelationId::new(2),
            Box::new(Recorder { name: "two", log: log.clone() }),
        );

        router.on_subscription_data(&message(2, "a")).unwrap();
        router.on_subscription_data(&message(1, "b")).unwrap();
        router.on_subscription_data(&message(3, "c")).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["two:a", "one:b"]);
        assert_eq!(router.dropped(), 1);
    }

    #[test]
    fn test_removed_handler_no_longer_receives() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = SubscriptionRouter::new();
        router.register(
            CorrelationId::new(1),
            Box::new(Recorder { name: "one", log: log.clone() }),
        );
        assert!(router.remove(CorrelationId::new(1)).is_some());
        router.on_subscription_data(&message(1, "a")).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }
}
