//! Event classification and dispatch state
//!
//! Both functions here are pure: the loop in `dispatcher` feeds them events
//! and acts on the answers.

use meridian_core::{Event, EventType};
use meridian_gateway::messages::status;

/// Where an event goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FinalResponse,
    PartialResponse,
    SubscriptionData,
    SubscriptionStatus,
    SessionStatus { terminated: bool },
    ServiceStatus,
    Other,
}

impl Route {
    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::SubscriptionData | Self::SubscriptionStatus)
    }
}

pub fn classify(event: &Event) -> Route {
    match event.event_type {
        EventType::Response => Route::FinalResponse,
        EventType::PartialResponse => Route::PartialResponse,
        EventType::SubscriptionData => Route::SubscriptionData,
        EventType::SubscriptionStatus => Route::SubscriptionStatus,
        EventType::SessionStatus => Route::SessionStatus {
            terminated: status::is_session_terminated(event),
        },
        EventType::ServiceStatus => Route::ServiceStatus,
        EventType::Miscellaneous => Route::Other,
    }
}

/// What the loop is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Until the final response of one request
    Request,
    /// Until the session ends or the caller shuts the loop down
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    AwaitingEvent,
    ProcessingResponse,
    ProcessingSubscription,
    Done,
}

impl DispatchState {
    /// State after handling an event routed to `route`. `Done` is absorbing.
    pub fn after(self, route: Route, mode: LoopMode) -> Self {
        if self == Self::Done {
            return Self::Done;
        }
        match route {
            Route::FinalResponse => match mode {
                LoopMode::Request => Self::Done,
                LoopMode::Subscription => Self::AwaitingEvent,
            },
            Route::PartialResponse => Self::ProcessingResponse,
            Route::SubscriptionData | Route::SubscriptionStatus => Self::ProcessingSubscription,
            Route::SessionStatus { terminated: true } => Self::Done,
            Route::SessionStatus { terminated: false } | Route::ServiceStatus | Route::Other => {
                Self::AwaitingEvent
            }
        }
    }

    pub fn is_done(&self) -> bool {
        *self == Self::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::{Element, Message};

    fn event(event_type: EventType) -> Event {
        Event::single(event_type, Message::new("m", Element::complex("m", vec![])))
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&event(EventType::Response)), Route::FinalResponse);
        assert_eq!(classify(&event(EventType::PartialResponse)), Route::PartialResponse);
        assert_eq!(classify(&event(EventType::Miscellaneous)), Route::Other);
        assert_eq!(
            classify(&status::session_terminated("bye")),
            Route::SessionStatus { terminated: true }
        );
        assert_eq!(
            classify(&status::session_started()),
            Route::SessionStatus { terminated: false }
        );
    }

    #[test]
    fn test_request_mode_transitions() {
        let state = DispatchState::default()
            .after(Route::PartialResponse, LoopMode::Request)
            .after(Route::SubscriptionData, LoopMode::Request);
        assert_eq!(state, DispatchState::ProcessingSubscription);
        let state = state.after(Route::FinalResponse, LoopMode::Request);
        assert!(state.is_done());
        assert_eq!(state.after(Route::PartialResponse, LoopMode::Request), DispatchState::Done);
    }

    #[test]
    fn test_subscription_mode_ignores_responses() {
        let state = DispatchState::ProcessingSubscription
            .after(Route::FinalResponse, LoopMode::Subscription);
        assert_eq!(state, DispatchState::AwaitingEvent);
        for route in [Route::SubscriptionData, Route::SubscriptionStatus] {
            assert!(!state.after(route, LoopMode::Subscription).is_done());
        }
        assert!(
            state
                .after(Route::SessionStatus { terminated: true }, LoopMode::Subscription)
                .is_done()
        );
    }
}
