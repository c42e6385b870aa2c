//! Wire message types for gateway communication
//!
//! The client sends [`ClientFrame`]s; the gateway answers with
//! [`meridian_core::Event`]s. Both are serialized with bincode.

pub mod frame;
pub mod status;

pub use frame::ClientFrame;
