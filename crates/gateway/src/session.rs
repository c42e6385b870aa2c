//! Gateway session
//!
//! A `Session` owns one link to the gateway. It opens services, sends
//! requests, starts and cancels subscriptions, and hands out inbound events.
//! It is single-writer: every operation takes `&mut self`.

use crate::config::SessionOptions;
use crate::error::{SessionError, TransportError};
use crate::messages::{ClientFrame, status};
use crate::response::ResponseStream;
use crate::transport::SessionLink;
use crate::transport::tcp::TcpLink;
use log::{debug, error, info, warn};
use meridian_core::{
    CorrelationId, CorrelationIdGenerator, Event, EventType, Names, Request, Subscription,
    SubscriptionList,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected and usable
    Started,
    /// The gateway ended the session or the connection dropped
    Terminated,
    /// Stopped by the caller
    Stopped,
}

/// Session over TCP
pub type TcpSession = Session<TcpLink<ClientFrame, Event>>;

/// A connection to the gateway
pub struct Session<L: SessionLink> {
    options: SessionOptions,
    link: L,
    state: SessionState,
    services: HashSet<String>,
    subscriptions: HashMap<CorrelationId, Subscription>,
    /// Events received while waiting for something else, oldest first
    pending: VecDeque<Event>,
    ids: CorrelationIdGenerator,
}

impl Session<TcpLink<ClientFrame, Event>> {
    /// Connect to the gateway at `options.host:options.port` and wait for the session to start
    pub async fn connect(options: &SessionOptions) -> Result<Self, SessionError> {
        let addr = options.address();
        info!("Connecting to gateway at {}", addr);
        let link = TcpLink::connect(&options.host, options.port, options.channel_capacity)
            .await
            .map_err(|e| SessionError::ConnectFailed {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        Self::start(options.clone(), link).await
    }
}

impl<L: SessionLink> Session<L> {
    /// Start a session over an already-established link.
    ///
    /// Waits for the gateway's `SessionStarted` status; events that arrive
    /// before it are kept for `next_event`.
    pub async fn start(options: SessionOptions, mut link: L) -> Result<Self, SessionError> {
        let addr = options.address();
        let connect_failed = |reason: String| SessionError::ConnectFailed {
            addr: addr.clone(),
            reason,
        };

        let mut pending = VecDeque::new();
        loop {
            let event = link.next().await.map_err(|e| connect_failed(e.to_string()))?;
            if event.event_type == EventType::SessionStatus {
                if event.has_message_type(Names::SESSION_STARTED) {
                    break;
                }
                if event.has_message_type(Names::SESSION_STARTUP_FAILURE)
                    || status::is_session_terminated(&event)
                {
                    let reason = event
                        .messages
                        .first()
                        .map(status::description)
                        .unwrap_or_default();
                    if let Err(e) = link.close().await {
                        warn!("Error closing link to {}: {}", addr, e);
                    }
                    return Err(connect_failed(reason));
                }
            }
            pending.push_back(event);
        }

        info!("Session started with {}", addr);
        Ok(Self {
            options,
            link,
            state: SessionState::Started,
            services: HashSet::new(),
            subscriptions: HashMap::new(),
            pending,
            ids: CorrelationIdGenerator::new(),
        })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Started
    }

    pub fn is_service_open(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn opened_services(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(String::as_str)
    }

    /// Subscriptions started and not yet cancelled or failed
    pub fn active_subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    pub fn subscription(&self, id: CorrelationId) -> Option<&Subscription> {
        self.subscriptions.get(&id)
    }

    /// Allocate a correlation id that no caller-chosen small token will collide with
    pub fn next_correlation_id(&mut self) -> CorrelationId {
        self.ids.next_id()
    }

    /// Open a named service.
    ///
    /// Returns `Ok(true)` when the gateway opened it and `Ok(false)` when it
    /// was already open.
    pub async fn open_service(&mut self, name: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        if self.services.contains(name) {
            return Ok(false);
        }

        let correlation_id = self.ids.next_id();
        self.send(ClientFrame::OpenService {
            service: name.to_string(),
            correlation_id,
        })
        .await?;

        loop {
            let event = self.read_link().await;
            if event.event_type == EventType::ServiceStatus && event.is_for(correlation_id) {
                if event.has_message_type(Names::SERVICE_OPENED) {
                    info!("Opened service {}", name);
                    self.services.insert(name.to_string());
                    return Ok(true);
                }
                let reason = event
                    .messages
                    .first()
                    .map(status::description)
                    .unwrap_or_default();
                return Err(SessionError::ServiceUnavailable {
                    service: name.to_string(),
                    reason,
                });
            }
            let terminated = status::is_session_terminated(&event);
            self.pending.push_back(event);
            if terminated {
                return Err(SessionError::SessionTerminated);
            }
        }
    }

    /// Send a request with a generated correlation id
    pub async fn send_request(
        &mut self,
        request: &Request,
    ) -> Result<ResponseStream<'_, L>, SessionError> {
        let correlation_id = self.ids.next_id();
        self.send_request_with_id(request, correlation_id).await
    }

    /// Send a request under a caller-chosen correlation id.
    ///
    /// The returned stream yields the events answering this request and ends
    /// after the final response.
    pub async fn send_request_with_id(
        &mut self,
        request: &Request,
        correlation_id: CorrelationId,
    ) -> Result<ResponseStream<'_, L>, SessionError> {
        self.ensure_open()?;
        if request.operation().is_empty() {
            return Err(SessionError::RequestInvalid(
                "request has no operation".to_string(),
            ));
        }
        if !self.services.contains(request.service()) {
            return Err(SessionError::RequestInvalid(format!(
                "service {} is not open",
                request.service()
            )));
        }
        if self.subscriptions.contains_key(&correlation_id) {
            return Err(SessionError::DuplicateCorrelationId(correlation_id));
        }

        debug!(
            "Sending {} to {} with {}",
            request.operation(),
            request.service(),
            correlation_id
        );
        self.send(ClientFrame::SendRequest {
            correlation_id,
            request: request.clone(),
        })
        .await?;
        Ok(ResponseStream::new(self, correlation_id))
    }

    /// Start every subscription in `list`
    pub async fn subscribe(&mut self, list: SubscriptionList) -> Result<(), SessionError> {
        self.ensure_open()?;
        for subscription in list.iter() {
            if self.subscriptions.contains_key(&subscription.correlation_id) {
                return Err(SessionError::DuplicateCorrelationId(
                    subscription.correlation_id,
                ));
            }
            if !self.services.contains(&subscription.service) {
                return Err(SessionError::RequestInvalid(format!(
                    "service {} is not open",
                    subscription.service
                )));
            }
        }

        let subscriptions = list.into_vec();
        for subscription in &subscriptions {
            info!(
                "Subscribing to {} with {}",
                subscription.topic_string(),
                subscription.correlation_id
            );
            self.subscriptions
                .insert(subscription.correlation_id, subscription.clone());
        }
        self.send(ClientFrame::Subscribe { subscriptions }).await
    }

    /// Cancel subscriptions; ids that are not active are skipped
    pub async fn unsubscribe(&mut self, ids: &[CorrelationId]) -> Result<(), SessionError> {
        self.ensure_open()?;
        let mut cancelled = Vec::with_capacity(ids.len());
        for id in ids {
            match self.subscriptions.remove(id) {
                Some(subscription) => {
                    info!("Unsubscribing from {} ({})", subscription.topic, id);
                    cancelled.push(*id);
                }
                None => warn!("Unsubscribe for unknown {}", id),
            }
        }
        if cancelled.is_empty() {
            return Ok(());
        }
        self.send(ClientFrame::Unsubscribe {
            correlation_ids: cancelled,
        })
        .await
    }

    /// Next inbound event, queued events first.
    ///
    /// After the session ends the terminal status event is returned once,
    /// then `SessionTerminated`.
    pub async fn next_event(&mut self) -> Result<Event, SessionError> {
        let event = match self.pending.pop_front() {
            Some(event) => event,
            None => {
                self.ensure_open()?;
                self.read_link().await
            }
        };
        self.track_subscription_status(&event);
        Ok(event)
    }

    /// Stop the session and release the transport. Safe to call more than once.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Stopped {
            return Ok(());
        }
        if self.state == SessionState::Started {
            if let Err(e) = self.link.send(ClientFrame::Stop).await {
                debug!("Stop frame not delivered: {}", e);
            }
        }
        if let Err(e) = self.link.close().await {
            warn!("Error closing transport: {}", e);
        }
        let was_open = self.state == SessionState::Started;
        self.state = SessionState::Stopped;
        self.services.clear();
        self.subscriptions.clear();
        if was_open {
            self.pending
                .push_back(status::session_terminated("session stopped"));
        }
        info!("Session with {} stopped", self.options.address());
        Ok(())
    }

    /// Next event for the request `id`. Unrelated events are queued.
    pub(crate) async fn next_response_event(
        &mut self,
        id: CorrelationId,
    ) -> Result<Event, SessionError> {
        let queued = self
            .pending
            .iter()
            .position(|e| e.event_type.is_response() && e.is_for(id));
        if let Some(event) = queued.and_then(|pos| self.pending.remove(pos)) {
            return Ok(event);
        }

        loop {
            self.ensure_open()?;
            let event = self.read_link().await;
            if event.event_type.is_response() && event.is_for(id) {
                return Ok(event);
            }
            let terminated = status::is_session_terminated(&event);
            self.pending.push_back(event);
            if terminated {
                return Err(SessionError::SessionTerminated);
            }
        }
    }

    async fn send(&mut self, frame: ClientFrame) -> Result<(), SessionError> {
        debug!("-> {}", frame.as_str());
        self.link.send(frame).await.map_err(|e| {
            error!("Failed to send to gateway: {}", e);
            SessionError::Transport(e)
        })
    }

    /// Read from the link, turning a dropped connection into a terminal status event
    async fn read_link(&mut self) -> Event {
        let event = match self.link.next().await {
            Ok(event) => event,
            Err(TransportError::ChannelClosed) => {
                warn!("Gateway closed the connection");
                status::session_terminated("connection closed by gateway")
            }
            Err(e) => {
                error!("Transport failure: {}", e);
                status::session_terminated(&e.to_string())
            }
        };
        if status::is_session_terminated(&event) {
            self.state = SessionState::Terminated;
            self.subscriptions.clear();
        }
        event
    }

    fn track_subscription_status(&mut self, event: &Event) {
        if event.event_type != EventType::SubscriptionStatus {
            return;
        }
        for message in event {
            let ended = message.message_type == Names::SUBSCRIPTION_FAILURE
                || message.message_type == Names::SUBSCRIPTION_TERMINATED;
            if ended {
                for id in &message.correlation_ids {
                    if self.subscriptions.remove(id).is_some() {
                        debug!("{} ended: {}", id, message.message_type);
                    }
                }
            }
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SessionError::SessionTerminated)
        }
    }
}

impl<L: SessionLink> Drop for Session<L> {
    fn drop(&mut self) {
        if self.state == SessionState::Started {
            warn!(
                "Session with {} dropped without stop(); releasing transport",
                self.options.address()
            );
        }
    }
}
