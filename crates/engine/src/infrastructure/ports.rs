//! Port traits for the hub's external collaborators.
//!
//! The hub only ever sees these traits; SQLite, the in-memory store, the tracing
//! publisher and the system clock are plugged in by `main`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use connect4_domain::GameId;
use connect4_shared::LeaderboardEntry;

// =============================================================================
// Errors
// =============================================================================

/// Storage operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

// =============================================================================
// Game Storage
// =============================================================================

/// A stored player profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub username: String,
    pub games_played: u32,
    pub games_won: u32,
}

/// A finished game as handed to the store.
///
/// Bot seats are recorded as `None`; only humans get player rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub game_id: GameId,
    pub player1: Option<String>,
    pub player2: Option<String>,
    /// Human winner; `None` on a draw or a bot win
    pub winner: Option<String>,
    pub is_draw: bool,
    pub is_bot_game: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Final snapshot as sent to clients
    pub final_state: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn get_or_create_player(&self, username: &str) -> Result<PlayerRecord, StoreError>;

    /// Store the game and bump the participants' statistics.
    async fn record_game(&self, record: GameRecord) -> Result<(), StoreError>;

    /// Best players first: most wins, then highest win percentage.
    async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

// =============================================================================
// Analytics
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    GameStart,
    Move,
    GameEnd,
    PlayerJoin,
    PlayerLeave,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub kind: GameEventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,
    pub data: Value,
}

impl GameEvent {
    pub fn new(
        kind: GameEventKind,
        timestamp: DateTime<Utc>,
        game_id: Option<GameId>,
        data: Value,
    ) -> Self {
        Self {
            kind,
            timestamp,
            game_id,
            data,
        }
    }
}

/// Fire-and-forget analytics sink.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: GameEvent);
}

// =============================================================================
// Time
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
