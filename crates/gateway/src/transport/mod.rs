//! Transport abstraction layer
//!
//! A `Link` is one end of a bidirectional, ordered message pipe. The session
//! drives a `Link<ClientFrame, Event>`; the gateway (or a test double) drives
//! the opposite end, a `Link<Event, ClientFrame>`.

pub mod channel;
pub mod codec;
pub mod tcp;

use crate::error::TransportError;
use crate::messages::ClientFrame;
use async_trait::async_trait;
use meridian_core::Event;
use serde::{Serialize, de::DeserializeOwned};

/// One end of a bidirectional message pipe
#[async_trait]
pub trait Link<Out, In>: Send
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    /// Send a message to the other end
    async fn send(&mut self, msg: Out) -> Result<(), TransportError>;

    /// Wait for the next message. Returns `ChannelClosed` once the other end is gone.
    ///
    /// Cancel-safe: dropping the future does not lose a message.
    async fn next(&mut self) -> Result<In, TransportError>;

    /// Close this end; further sends fail
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Client end, driven by a `Session`
pub trait SessionLink: Link<ClientFrame, Event> {}

impl<T: Link<ClientFrame, Event>> SessionLink for T {}

/// Gateway end, driven by a gateway implementation
pub trait GatewayLink: Link<Event, ClientFrame> {}

impl<T: Link<Event, ClientFrame>> GatewayLink for T {}
