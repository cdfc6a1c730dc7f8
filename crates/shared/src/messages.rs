//! WebSocket message types for engine-client communication
//!
//! Clients send `{"type": ..., "payload": ...}`; the engine answers with
//! `{"type": ..., "gameId": ..., "payload": ...}`. Field names are camelCase on the wire.
//!
//! ## Compatibility
//!
//! - `join` accepts either a bare username string (friend mode) or `{username, gameMode}`
//! - An unrecognised `gameMode` falls back to friend mode
//! - Unknown message types fail to parse; the engine logs and ignores them

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use connect4_domain::{COLS, ROWS};

// =============================================================================
// Client Messages (Client → Engine)
// =============================================================================

/// How a joining player wants to be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Pair with the next human (bot after the matchmaking timeout)
    #[default]
    Friend,
    /// Play the bot right away
    Computer,
}

impl GameMode {
    fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some("computer") => Self::Computer,
            _ => Self::Friend,
        }
    }
}

/// Messages from a client to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    try_from = "RawClientMessage"
)]
pub enum ClientMessage {
    /// Enter matchmaking, or resume a session after a dropped connection
    Join {
        username: String,
        #[serde(rename = "gameMode")]
        mode: GameMode,
    },
    /// Drop a token into a column
    Move { column: i64 },
    /// Leave the waiting slot
    CancelWaiting,
    /// Ask for a rematch after the game ended
    PlayAgain,
    /// Leave the current session
    ExitGame,
}

/// Why an inbound frame could not be turned into a [`ClientMessage`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("join payload must be a username or an object with a non-empty username")]
    InvalidJoin,

    #[error("move payload must contain an integer column")]
    InvalidMove,
}

/// Loose shape accepted off the wire before validation.
#[derive(Debug, Deserialize)]
struct RawClientMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl TryFrom<RawClientMessage> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(raw: RawClientMessage) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "join" => parse_join(&raw.payload),
            "move" => {
                let column = raw.payload.get("column").ok_or(ProtocolError::InvalidMove)?;
                let column = column
                    .as_i64()
                    .or_else(|| column.as_f64().map(|c| c.trunc() as i64))
                    .ok_or(ProtocolError::InvalidMove)?;
                Ok(Self::Move { column })
            }
            "cancelWaiting" => Ok(Self::CancelWaiting),
            "playAgain" => Ok(Self::PlayAgain),
            "exitGame" => Ok(Self::ExitGame),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

fn parse_join(payload: &Value) -> Result<ClientMessage, ProtocolError> {
    let (username, mode) = match payload {
        Value::String(name) => (name.as_str(), GameMode::Friend),
        Value::Object(fields) => {
            let username = fields
                .get("username")
                .and_then(Value::as_str)
                .ok_or(ProtocolError::InvalidJoin)?;
            let mode = GameMode::parse_lenient(fields.get("gameMode").and_then(Value::as_str));
            (username, mode)
        }
        _ => return Err(ProtocolError::InvalidJoin),
    };

    let username = username.trim();
    if username.is_empty() {
        return Err(ProtocolError::InvalidJoin);
    }

    Ok(ClientMessage::Join {
        username: username.to_string(),
        mode,
    })
}

// =============================================================================
// Server Messages (Engine → Client)
// =============================================================================

/// Messages from the engine to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Full snapshot; also used for the synthesized "waiting" state
    GameState(GameStatePayload),
    /// A move was rejected
    Error { message: String },
    /// The game reached a win or a draw
    GameFinished(GameResultPayload),
    /// The opponent came back within the grace window
    PlayerReconnected { username: String },
    /// A disconnected player's seat was handed to the bot
    PlayerReplaced {
        replaced_player: String,
        new_player: String,
        game_state: GameStatePayload,
    },
    /// The opponent left the session
    OpponentExited { game_id: String, message: String },
    /// Current list of rematch requests
    PlayAgainUpdate { play_again_requests: Vec<String> },
    /// Acknowledges `cancelWaiting`
    WaitingCancelled { message: String },
    /// A finished game was stored; sent to every connected client
    LeaderboardUpdate(GameResultPayload),
}

/// A [`ServerMessage`] together with the session it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFrame {
    #[serde(rename = "gameId", default)]
    pub game_id: String,
    #[serde(flatten)]
    pub message: ServerMessage,
}

impl ServerFrame {
    pub fn new(game_id: impl Into<String>, message: ServerMessage) -> Self {
        Self {
            game_id: game_id.into(),
            message,
        }
    }

    /// A frame that belongs to no session.
    pub fn unscoped(message: ServerMessage) -> Self {
        Self::new(String::new(), message)
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Status string carried in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireStatus {
    Waiting,
    InProgress,
    Completed,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub username: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMoveInfo {
    pub row: usize,
    pub column: usize,
    pub player: u8,
}

/// Snapshot of one session as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatePayload {
    pub id: String,
    /// Rows top to bottom; 0 empty, 1 and 2 the players' tokens
    pub board: Vec<Vec<u8>>,
    pub current_turn: u8,
    pub status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMoveInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub play_again_requests: Vec<String>,
}

impl GameStatePayload {
    /// Placeholder sent to a player parked in the waiting slot.
    pub fn waiting() -> Self {
        Self {
            id: String::new(),
            board: vec![vec![0; COLS]; ROWS],
            current_turn: 1,
            status: WireStatus::Waiting,
            player1: None,
            player2: None,
            winner: None,
            last_move: None,
            play_again_requests: Vec::new(),
        }
    }
}

/// Outcome announcement shared by `gameFinished` and `leaderboardUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultPayload {
    pub game_id: String,
    pub is_draw: bool,
    /// Human winner only; omitted on a draw or a bot win
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub bot_won: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<ClientMessage, serde_json::Error> {
        serde_json::from_value(value)
    }

    mod client {
        use super::*;

        #[test]
        fn join_with_object_payload() {
            let msg = parse(json!({
                "type": "join",
                "payload": {"username": "alice", "gameMode": "computer"}
            }))
            .unwrap();
            assert_eq!(
                msg,
                ClientMessage::Join {
                    username: "alice".to_string(),
                    mode: GameMode::Computer
                }
            );
        }

        #[test]
        fn bare_username_joins_friend_mode() {
            let msg = parse(json!({"type": "join", "payload": "bob"})).unwrap();
            assert_eq!(
                msg,
                ClientMessage::Join {
                    username: "bob".to_string(),
                    mode: GameMode::Friend
                }
            );
        }

        #[test]
        fn unknown_or_missing_mode_means_friend() {
            for payload in [
                json!({"username": "carol"}),
                json!({"username": "carol", "gameMode": "tournament"}),
            ] {
                let msg = parse(json!({"type": "join", "payload": payload})).unwrap();
                assert!(matches!(
                    msg,
                    ClientMessage::Join {
                        mode: GameMode::Friend,
                        ..
                    }
                ));
            }
        }

        #[test]
        fn join_without_username_is_rejected() {
            assert!(parse(json!({"type": "join", "payload": {"gameMode": "friend"}})).is_err());
            assert!(parse(json!({"type": "join", "payload": "   "})).is_err());
            assert!(parse(json!({"type": "join"})).is_err());
        }

        #[test]
        fn move_column_may_be_negative_or_float() {
            assert_eq!(
                parse(json!({"type": "move", "payload": {"column": -2}})).unwrap(),
                ClientMessage::Move { column: -2 }
            );
            assert_eq!(
                parse(json!({"type": "move", "payload": {"column": 4.0}})).unwrap(),
                ClientMessage::Move { column: 4 }
            );
            assert!(parse(json!({"type": "move", "payload": {"column": "4"}})).is_err());
        }

        #[test]
        fn control_messages_ignore_payload() {
            assert_eq!(
                parse(json!({"type": "cancelWaiting"})).unwrap(),
                ClientMessage::CancelWaiting
            );
            assert_eq!(
                parse(json!({"type": "playAgain", "payload": {}})).unwrap(),
                ClientMessage::PlayAgain
            );
            assert_eq!(
                parse(json!({"type": "exitGame", "payload": null})).unwrap(),
                ClientMessage::ExitGame
            );
        }

        #[test]
        fn unknown_type_is_an_error() {
            let err = parse(json!({"type": "chat", "payload": "hi"})).unwrap_err();
            assert!(err.to_string().contains("unknown message type: chat"));
        }

        #[test]
        fn serialized_join_parses_back() {
            let msg = ClientMessage::Join {
                username: "dave".to_string(),
                mode: GameMode::Computer,
            };
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(
                value,
                json!({"type": "join", "payload": {"username": "dave", "gameMode": "computer"}})
            );
            assert_eq!(parse(value).unwrap(), msg);
        }
    }

    mod server {
        use super::*;

        #[test]
        fn frame_carries_type_game_id_and_payload() {
            let frame = ServerFrame::new(
                "g-1",
                ServerMessage::OpponentExited {
                    game_id: "g-1".to_string(),
                    message: "opponentExited".to_string(),
                },
            );
            assert_eq!(
                serde_json::to_value(&frame).unwrap(),
                json!({
                    "type": "opponentExited",
                    "gameId": "g-1",
                    "payload": {"gameId": "g-1", "message": "opponentExited"}
                })
            );
        }

        #[test]
        fn waiting_state_shape() {
            let frame =
                ServerFrame::unscoped(ServerMessage::GameState(GameStatePayload::waiting()));
            let value = serde_json::to_value(&frame).unwrap();

            assert_eq!(value["type"], "gameState");
            assert_eq!(value["gameId"], "");
            assert_eq!(value["payload"]["status"], "waiting");
            assert_eq!(value["payload"]["currentTurn"], 1);
            assert_eq!(value["payload"]["board"].as_array().unwrap().len(), ROWS);
            assert!(value["payload"].get("player1").is_none());
            assert!(value["payload"].get("playAgainRequests").is_none());
        }

        #[test]
        fn bot_win_omits_the_winner() {
            let frame = ServerFrame::new(
                "g-2",
                ServerMessage::GameFinished(GameResultPayload {
                    game_id: "g-2".to_string(),
                    is_draw: false,
                    winner: None,
                    bot_won: true,
                }),
            );
            assert_eq!(
                serde_json::to_value(&frame).unwrap()["payload"],
                json!({"gameId": "g-2", "isDraw": false, "botWon": true})
            );
        }

        #[test]
        fn player_replaced_nests_the_snapshot() {
            let message = ServerMessage::PlayerReplaced {
                replaced_player: "bob".to_string(),
                new_player: "AI Bot".to_string(),
                game_state: GameStatePayload::waiting(),
            };
            let value = serde_json::to_value(ServerFrame::new("g-3", message)).unwrap();
            assert_eq!(value["payload"]["replacedPlayer"], "bob");
            assert_eq!(value["payload"]["newPlayer"], "AI Bot");
            assert_eq!(value["payload"]["gameState"]["status"], "waiting");
        }

        #[test]
        fn frames_parse_back_for_clients() {
            let frame = ServerFrame::new(
                "g-4",
                ServerMessage::PlayAgainUpdate {
                    play_again_requests: vec!["alice".to_string()],
                },
            );
            let text = serde_json::to_string(&frame).unwrap();
            let decoded: ServerFrame = serde_json::from_str(&text).unwrap();
            assert_eq!(decoded, frame);
        }
    }
}
