//! Infrastructure layer - configuration, port traits and their implementations.

pub mod clock;
pub mod config;
pub mod events;
pub mod memory_store;
pub mod ports;
pub mod store;
