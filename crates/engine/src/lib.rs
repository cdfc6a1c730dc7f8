//! Connect4 Engine library.
//!
//! Real-time backend for Connect Four: matchmaking, live sessions, the bot opponent and
//! persisted results.
//!
//! ## Structure
//!
//! - `hub/` - Session hub owning participants, sessions and timers
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod hub;
pub mod infrastructure;

pub use app::App;
