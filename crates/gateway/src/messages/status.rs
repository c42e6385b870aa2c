//! Session and service status events

use meridian_core::walker::get_string;
use meridian_core::{CorrelationId, Element, Event, EventType, Message, Names};

/// Element name carrying the service name in service status messages
pub const SERVICE_NAME: &str = "serviceName";

fn status(message_type: &str, description: &str) -> Message {
    Message::new(
        message_type,
        Element::complex(
            message_type,
            vec![Element::scalar(Names::DESCRIPTION, description)],
        ),
    )
}

pub fn session_started() -> Event {
    Event::single(
        EventType::SessionStatus,
        status(Names::SESSION_STARTED, "session started"),
    )
}

pub fn session_startup_failure(reason: &str) -> Event {
    Event::single(
        EventType::SessionStatus,
        status(Names::SESSION_STARTUP_FAILURE, reason),
    )
}

pub fn session_terminated(reason: &str) -> Event {
    Event::single(
        EventType::SessionStatus,
        status(Names::SESSION_TERMINATED, reason),
    )
}

fn service_status(message_type: &str, service: &str, id: CorrelationId, reason: &str) -> Event {
    let mut message = status(message_type, reason);
    message.body.push(Element::scalar(SERVICE_NAME, service));
    Event::single(EventType::ServiceStatus, message.with_correlation_id(id))
}

pub fn service_opened(service: &str, id: CorrelationId) -> Event {
    service_status(Names::SERVICE_OPENED, service, id, "service opened")
}

pub fn service_open_failure(service: &str, id: CorrelationId, reason: &str) -> Event {
    service_status(Names::SERVICE_OPEN_FAILURE, service, id, reason)
}

/// True for a session status event announcing termination
pub fn is_session_terminated(event: &Event) -> bool {
    event.event_type == EventType::SessionStatus
        && event.has_message_type(Names::SESSION_TERMINATED)
}

/// Human-readable description of a status message
pub fn description(message: &Message) -> String {
    get_string(&message.body, Names::DESCRIPTION).unwrap_or_else(|_| message.message_type.clone())
}
