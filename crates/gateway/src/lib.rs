//! Meridian Gateway
//!
//! Session harness for a market-data gateway. Provides:
//! - Transport abstraction (tokio channels and length-prefixed TCP frames)
//! - Wire frames sent by the client and status events sent by the gateway
//! - `Session`: open services, send requests, manage subscriptions
//!
//! ## Architecture
//!
//! ```text
//!   Caller
//!     │ open_service / send_request / subscribe
//!  ┌──▼──────┐        ClientFrame         ┌─────────┐
//!  │ Session │ ─────────────────────────► │ Gateway │
//!  │         │ ◄───────────────────────── │         │
//!  └──┬──────┘          Event             └─────────┘
//!     │ ResponseStream (one request)
//!     │ next_event     (everything else)
//!     ▼
//!  Dispatch loop
//! ```
//!
//! ## Transport
//!
//! `ChannelLink` runs client and gateway in one process (tests, simulation).
//! `TcpLink` carries the same frames over a socket. Both implement `Link`,
//! so the session does not care which one it drives.

pub mod config;
pub mod error;
pub mod messages;
pub mod response;
pub mod services;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{ConfigError, GatewayConfigFile, SessionOptions};
pub use error::{SessionError, TransportError};
pub use messages::ClientFrame;
pub use response::ResponseStream;
pub use services::{Operations, Services};
pub use session::{Session, SessionState, TcpSession};
pub use transport::{
    GatewayLink, Link, SessionLink,
    channel::ChannelLink,
    tcp::TcpLink,
};
