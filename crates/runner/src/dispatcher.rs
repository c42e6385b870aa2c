//! Dispatch loop
//!
//! Reads events from a session, classifies them, and hands each message to
//! an `EventHandler`. A failing handler call is logged and counted; the loop
//! carries on with the next message.

use crate::dispatch::{DispatchState, LoopMode, Route, classify};
use crate::handler::EventHandler;
use log::{debug, info, warn};
use meridian_core::{Event, Request};
use meridian_gateway::{Session, SessionError, SessionLink};
use std::future::Future;

/// Counters kept by a dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub events: u64,
    pub messages: u64,
    /// Response messages, partial and final
    pub responses: u64,
    /// Subscription data and status messages
    pub subscription_updates: u64,
    pub handler_errors: u64,
}

pub struct Dispatcher<H: EventHandler> {
    handler: H,
    stats: DispatchStats,
}

impl<H: EventHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            stats: DispatchStats::default(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Deliver every message of `event` to the handler
    pub fn dispatch(&mut self, event: &Event) -> Route {
        let route = classify(event);
        self.stats.events += 1;

        for message in event {
            self.stats.messages += 1;
            let result = match route {
                Route::FinalResponse | Route::PartialResponse => {
                    self.stats.responses += 1;
                    self.handler
                        .on_response(message, route == Route::FinalResponse)
                }
                Route::SubscriptionData => {
                    self.stats.subscription_updates += 1;
                    self.handler.on_subscription_data(message)
                }
                Route::SubscriptionStatus => {
                    self.stats.subscription_updates += 1;
                    self.handler.on_subscription_status(message)
                }
                Route::SessionStatus { .. } => self.handler.on_session_status(message),
                Route::ServiceStatus | Route::Other => {
                    self.handler.on_other(event.event_type, message)
                }
            };
            if let Err(e) = result {
                warn!("Handler failed on {}: {}", message.message_type, e);
                self.stats.handler_errors += 1;
            }
        }
        route
    }

    /// Send `request` and dispatch its events until the final response.
    ///
    /// Subscription traffic that arrives meanwhile stays queued on the session.
    pub async fn run_request<L: SessionLink>(
        &mut self,
        session: &mut Session<L>,
        request: &Request,
    ) -> Result<DispatchStats, SessionError> {
        let mut responses = session.send_request(request).await?;
        let mut state = DispatchState::AwaitingEvent;
        while let Some(event) = responses.next().await {
            let route = self.dispatch(&event?);
            state = state.after(route, LoopMode::Request);
            if state.is_done() {
                break;
            }
        }
        debug!("Request {} done: {:?}", request.operation(), self.stats);
        Ok(self.stats)
    }

    /// Dispatch events until the session terminates or `shutdown` resolves
    pub async fn run_subscriptions<L, F>(
        &mut self,
        session: &mut Session<L>,
        shutdown: F,
    ) -> Result<DispatchStats, SessionError>
    where
        L: SessionLink,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut state = DispatchState::AwaitingEvent;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = session.next_event() => {
                    let route = self.dispatch(&event?);
                    state = state.after(route, LoopMode::Subscription);
                    if state.is_done() {
                        info!("Session ended");
                        break;
                    }
                }
            }
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerError;
    use meridian_core::{CorrelationId, Element, EventType, Message};

    #[derive(Default)]
    struct Counting {
        finals: usize,
        partials: usize,
        data: usize,
    }

    impl EventHandler for Counting {
        fn on_response(&mut self, message: &Message, is_final: bool) -> Result<(), HandlerError> {
            if message.message_type == "broken" {
                return Err(HandlerError::Other("cannot print".to_string()));
            }
            if is_final {
                self.finals += 1;
            } else {
                self.partials += 1;
            }
            Ok(())
        }

        fn on_subscription_data(&mut self, _message: &Message) -> Result<(), HandlerError> {
            self.data += 1;
            Ok(())
        }
    }

    fn message(message_type: &str) -> Message {
        Message::new(message_type, Element::complex(message_type, vec![]))
            .with_correlation_id(CorrelationId::new(1))
    }

    #[test]
    fn test_handler_error_does_not_stop_event() {
        let mut dispatcher = Dispatcher::new(Counting::default());
        let event = Event::new(
            EventType::PartialResponse,
            vec![message("broken"), message("ok"), message("ok")],
        );
        assert_eq!(dispatcher.dispatch(&event), Route::PartialResponse);
        assert_eq!(dispatcher.handler().partials, 2);

        let stats = dispatcher.stats();
        assert_eq!(stats.events, 1);
        assert_eq!(stats.messages, 3);
        assert_eq!(stats.handler_errors, 1);
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let mut dispatcher = Dispatcher::new(Counting::default());
        dispatcher.dispatch(&Event::single(EventType::SubscriptionData, message("tick")));
        dispatcher.dispatch(&Event::single(EventType::Response, message("done")));
        let handler = dispatcher.into_handler();
        assert_eq!(handler.data, 1);
        assert_eq!(handler.finals, 1);
    }
}
