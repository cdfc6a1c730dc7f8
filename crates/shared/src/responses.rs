//! Response bodies for the read-only HTTP endpoints.

use serde::{Deserialize, Serialize};

/// What a connected player is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveUserStatus {
    Waiting,
    InGame,
}

/// One entry of `GET /active-users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub username: String,
    pub status: ActiveUserStatus,
}

/// One row of `GET /leaderboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub games_played: u32,
    pub games_won: u32,
    /// 0-100, rounded to two decimals
    pub win_percentage: f64,
}

impl LeaderboardEntry {
    pub fn new(username: impl Into<String>, games_played: u32, games_won: u32) -> Self {
        let win_percentage = if games_played == 0 {
            0.0
        } else {
            (f64::from(games_won) * 10_000.0 / f64::from(games_played)).round() / 100.0
        };
        Self {
            username: username.into(),
            games_played,
            games_won,
            win_percentage,
        }
    }
}
