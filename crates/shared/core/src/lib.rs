//! Meridian Core
//!
//! Pure data model for the Meridian gateway client harness.
//! This crate contains no async, no I/O, and is 100% unit testable.
//!
//! - **Values**: scalar type tags and typed values
//! - **Elements**: the tree-shaped payload carried by every message
//! - **Events**: kind-tagged batches of messages
//! - **Requests / Subscriptions**: outbound queries and streams
//! - **Walker**: typed field extraction with structured errors

pub mod correlation;
pub mod element;
pub mod error;
pub mod event;
pub mod items;
pub mod names;
pub mod request;
pub mod subscription;
pub mod values;
pub mod walker;

// Re-export commonly used types at crate root
pub use correlation::{CorrelationId, CorrelationIdGenerator};
pub use element::{Element, ElementBody};
pub use error::{SubscriptionListError, WalkError, WalkResult};
pub use event::{Event, EventType, Message};
pub use items::{ErrorInfo, FieldException, SecurityError};
pub use names::Names;
pub use request::{Request, RequestBuilder};
pub use subscription::{Subscription, SubscriptionList};
pub use values::{TypeTag, Value};
pub use walker::{FieldValue, Sequence};
