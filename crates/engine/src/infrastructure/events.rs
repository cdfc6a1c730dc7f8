//! Analytics publisher that writes events to the log stream.
//!
//! Each event becomes one `info` line on the `analytics` target with the event serialized as
//! JSON, so a log shipper can route it without parsing free text.

use chrono::{DateTime, Utc};
use serde_json::json;

use connect4_domain::{GameId, LastMove};

use crate::infrastructure::ports::{EventPublisher, GameEvent, GameEventKind};

pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: GameEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(
                target: "analytics",
                event_type = ?event.kind,
                game_id = ?event.game_id,
                %payload,
                "Game event"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize analytics event"),
        }
    }
}

// =============================================================================
// Event builders
// =============================================================================

pub(crate) fn game_start(
    timestamp: DateTime<Utc>,
    game_id: GameId,
    player1: &str,
    player2: &str,
    is_bot_game: bool,
) -> GameEvent {
    GameEvent::new(
        GameEventKind::GameStart,
        timestamp,
        Some(game_id),
        json!({ "player1": player1, "player2": player2, "isBotGame": is_bot_game }),
    )
}

pub(crate) fn game_move(
    timestamp: DateTime<Utc>,
    game_id: GameId,
    username: &str,
    placed: LastMove,
) -> GameEvent {
    GameEvent::new(
        GameEventKind::Move,
        timestamp,
        Some(game_id),
        json!({ "player": username, "row": placed.row, "column": placed.column }),
    )
}

pub(crate) fn game_end(
    timestamp: DateTime<Utc>,
    game_id: GameId,
    winner: Option<&str>,
    is_draw: bool,
    duration_secs: i64,
) -> GameEvent {
    GameEvent::new(
        GameEventKind::GameEnd,
        timestamp,
        Some(game_id),
        json!({ "winner": winner, "isDraw": is_draw, "duration": duration_secs }),
    )
}

pub(crate) fn presence(
    kind: GameEventKind,
    timestamp: DateTime<Utc>,
    game_id: Option<GameId>,
    username: &str,
) -> GameEvent {
    GameEvent::new(kind, timestamp, game_id, json!({ "player": username }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use connect4_domain::PlayerNumber;

    #[test]
    fn event_serializes_with_type_and_camel_case_fields() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let id = GameId::new();
        let event = game_move(
            at,
            id,
            "alice",
            LastMove {
                row: 5,
                column: 3,
                player: PlayerNumber::One,
            },
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "move");
        assert_eq!(value["gameId"], id.to_string());
        assert_eq!(value["data"], json!({"player": "alice", "row": 5, "column": 3}));
        assert!(value["timestamp"].as_str().unwrap().starts_with("2026-01-02T03:04:05"));
    }

    #[test]
    fn presence_without_session_omits_game_id() {
        let event = presence(GameEventKind::PlayerJoin, Utc::now(), None, "bob");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "player_join");
        assert!(value.get("gameId").is_none());
    }

    #[test]
    fn bot_win_has_null_winner() {
        let event = game_end(Utc::now(), GameId::new(), None, false, 42);
        assert_eq!(
            serde_json::to_value(&event).unwrap()["data"],
            json!({"winner": null, "isDraw": false, "duration": 42})
        );
    }
}
