mod gateway;
mod params;
mod reference;
mod streams;
mod study;

pub use gateway::{FrameOutcome, SimConfig, SimGateway, spawn_in_process};
pub use streams::StreamRegistry;
