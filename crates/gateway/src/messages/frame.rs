//! Client-to-gateway frames

use meridian_core::{CorrelationId, Request, Subscription};
use serde::{Deserialize, Serialize};

/// Frame sent from a session to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientFrame {
    /// Open a named service; answered by a `ServiceStatus` event
    OpenService {
        service: String,
        correlation_id: CorrelationId,
    },
    /// Send a request; answered by zero or more partial responses and one final response
    SendRequest {
        correlation_id: CorrelationId,
        request: Request,
    },
    /// Start subscriptions; answered by subscription status and data events
    Subscribe { subscriptions: Vec<Subscription> },
    /// Cancel subscriptions by correlation id
    Unsubscribe { correlation_ids: Vec<CorrelationId> },
    /// End the session
    Stop,
}

impl ClientFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenService { .. } => "open_service",
            Self::SendRequest { .. } => "send_request",
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Stop => "stop",
        }
    }
}
