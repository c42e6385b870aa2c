//! Inbound events and the messages they carry

use crate::correlation::CorrelationId;
use crate::element::Element;
use serde::{Deserialize, Serialize};

/// Kind tag of an inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Final response to a request
    Response,
    /// Part of a response; more events for the same request follow
    PartialResponse,
    SubscriptionData,
    SubscriptionStatus,
    SessionStatus,
    /// Outcome of an open-service call
    ServiceStatus,
    Miscellaneous,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "RESPONSE",
            Self::PartialResponse => "PARTIAL_RESPONSE",
            Self::SubscriptionData => "SUBSCRIPTION_DATA",
            Self::SubscriptionStatus => "SUBSCRIPTION_STATUS",
            Self::SessionStatus => "SESSION_STATUS",
            Self::ServiceStatus => "SERVICE_STATUS",
            Self::Miscellaneous => "MISCELLANEOUS",
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response | Self::PartialResponse)
    }

    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::SubscriptionData | Self::SubscriptionStatus)
    }
}

/// A named payload delivered inside an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type, e.g. `HistoricalDataResponse`, `SubscriptionStarted`
    pub message_type: String,
    /// Tokens of the requests/subscriptions this message answers
    pub correlation_ids: Vec<CorrelationId>,
    /// Subscription topic, for subscription messages
    pub topic: Option<String>,
    pub body: Element,
}

impl Message {
    pub fn new(message_type: impl Into<String>, body: Element) -> Self {
        Self {
            message_type: message_type.into(),
            correlation_ids: Vec::new(),
            topic: None,
            body,
        }
    }

    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_ids.push(id);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// First correlation id, which is the only one for request responses
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_ids.first().copied()
    }

    pub fn is_for(&self, id: CorrelationId) -> bool {
        self.correlation_ids.contains(&id)
    }
}

/// An inbound unit of one or more messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub messages: Vec<Message>,
}

impl Event {
    pub fn new(event_type: EventType, messages: Vec<Message>) -> Self {
        Self {
            event_type,
            messages,
        }
    }

    pub fn single(event_type: EventType, message: Message) -> Self {
        Self::new(event_type, vec![message])
    }

    pub fn is_final_response(&self) -> bool {
        self.event_type == EventType::Response
    }

    /// True when any message in the event answers `id`
    pub fn is_for(&self, id: CorrelationId) -> bool {
        self.messages.iter().any(|m| m.is_for(id))
    }

    /// True when any message has the given message type
    pub fn has_message_type(&self, message_type: &str) -> bool {
        self.messages.iter().any(|m| m.message_type == message_type)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Event {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, id: u64) -> Message {
        Message::new(name, Element::complex(name, vec![]))
            .with_correlation_id(CorrelationId::new(id))
    }

    #[test]
    fn test_event_correlation() {
        let event = Event::new(
            EventType::SubscriptionStatus,
            vec![status("SubscriptionStarted", 1), status("SubscriptionStarted", 2)],
        );
        assert!(event.is_for(CorrelationId::new(2)));
        assert!(!event.is_for(CorrelationId::new(3)));
        assert!(event.has_message_type("SubscriptionStarted"));
        assert!(!event.is_final_response());
    }

    #[test]
    fn test_event_type_groups() {
        assert!(EventType::PartialResponse.is_response());
        assert!(EventType::SubscriptionData.is_subscription());
        assert!(!EventType::SessionStatus.is_response());
        assert_eq!(EventType::Response.as_str(), "RESPONSE");
    }
}
