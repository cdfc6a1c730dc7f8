//! Connect4 Shared - wire types for engine/client communication
//!
//! This crate contains the types exchanged with browser clients:
//! - WebSocket frames in both directions (`ClientMessage`, `ServerFrame`)
//! - The game state snapshot sent after every change
//! - HTTP response bodies for the read-only endpoints
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json and thiserror, plus `connect4-domain` for
//!    the board dimensions
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - ids travel as strings

pub mod messages;
pub mod responses;

// =============================================================================
// WebSocket Message Types
// =============================================================================
pub use messages::{
    ClientMessage, GameMode, GameResultPayload, GameStatePayload, LastMoveInfo, PlayerInfo,
    ProtocolError, ServerFrame, ServerMessage, WireStatus,
};

// =============================================================================
// HTTP Response Types
// =============================================================================
pub use responses::{ActiveUser, ActiveUserStatus, LeaderboardEntry};
