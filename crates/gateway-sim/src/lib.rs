//! Meridian Gateway Simulator
//!
//! A stand-in for the market-data gateway. It speaks the same frames as the
//! real thing, answers reference-data, portfolio and study requests from a
//! deterministic price model, and publishes subscription ticks.

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod error;
pub mod model;

// Re-export main types for convenience
pub use application::{FrameOutcome, SimConfig, SimGateway, spawn_in_process};
pub use error::{Result, SimError};
pub use infrastructure::server::{bind, serve_tcp};
pub use model::MarketModel;
