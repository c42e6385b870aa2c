//! Meridian Runner - Dispatch Loop
//!
//! Drives a `Session` until the work is done:
//!
//! - **Dispatch**: pure event classification and state transitions
//! - **Handler**: per-message callbacks supplied by the program
//! - **Router**: subscription messages fanned out by correlation id
//! - **Dispatcher**: the request and subscription loops
//!
//! ## Architecture
//!
//! ```text
//!   Session::next_event / ResponseStream
//!                  │ Event
//!                  ▼
//!          ┌───────────────┐   Route    ┌───────────────┐
//!          │   classify    ├──────────► │ DispatchState │── Done ──► exit
//!          └───────┬───────┘            └───────────────┘
//!                  │ Message (one call each)
//!                  ▼
//!          ┌───────────────┐
//!          │ EventHandler  │  SubscriptionRouter ─► handler per token
//!          └───────────────┘
//! ```

pub mod dispatch;
pub mod dispatcher;
pub mod handler;
pub mod router;

// Re-export main types
pub use dispatch::{DispatchState, LoopMode, Route, classify};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use handler::{EventHandler, HandlerError};
pub use router::{SubscriptionHandler, SubscriptionRouter};
