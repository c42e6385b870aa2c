//! Response streams

use crate::error::SessionError;
use crate::session::Session;
use crate::transport::SessionLink;
use meridian_core::{CorrelationId, Event};

/// Events answering one request, ending with the final response.
///
/// Nothing past the final response is read from the session; events for
/// other requests or subscriptions stay queued on the session.
pub struct ResponseStream<'s, L: SessionLink> {
    session: &'s mut Session<L>,
    correlation_id: CorrelationId,
    finished: bool,
}

impl<'s, L: SessionLink> ResponseStream<'s, L> {
    pub(crate) fn new(session: &'s mut Session<L>, correlation_id: CorrelationId) -> Self {
        Self {
            session,
            correlation_id,
            finished: false,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// True once the final response (or an error) has been yielded
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Next response event, or `None` after the final one
    pub async fn next(&mut self) -> Option<Result<Event, SessionError>> {
        if self.finished {
            return None;
        }
        let result = self.session.next_response_event(self.correlation_id).await;
        match &result {
            Ok(event) if event.is_final_response() => self.finished = true,
            Ok(_) => {}
            Err(_) => self.finished = true,
        }
        Some(result)
    }

    /// Drain the stream, returning every event up to and including the final response
    pub async fn collect(mut self) -> Result<Vec<Event>, SessionError> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event?);
        }
        Ok(events)
    }
}
