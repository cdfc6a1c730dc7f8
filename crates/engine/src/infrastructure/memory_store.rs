//! In-process game store used when no database path is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use connect4_shared::LeaderboardEntry;

use crate::infrastructure::ports::{GameRecord, GameStore, PlayerRecord, StoreError};

#[derive(Default)]
struct Inner {
    players: HashMap<String, PlayerRecord>,
    /// Finished games only feed the player totals; the records themselves are not kept
    games_recorded: usize,
}

#[derive(Default)]
pub struct InMemoryGameStore {
    inner: RwLock<Inner>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded games.
    pub async fn game_count(&self) -> usize {
        self.inner.read().await.games_recorded
    }
}

fn entry<'a>(
    players: &'a mut HashMap<String, PlayerRecord>,
    username: &str,
) -> &'a mut PlayerRecord {
    players
        .entry(username.to_string())
        .or_insert_with(|| PlayerRecord {
            username: username.to_string(),
            games_played: 0,
            games_won: 0,
        })
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn get_or_create_player(&self, username: &str) -> Result<PlayerRecord, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(entry(&mut inner.players, username).clone())
    }

    async fn record_game(&self, record: GameRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for username in [&record.player1, &record.player2].into_iter().flatten() {
            let player = entry(&mut inner.players, username);
            player.games_played += 1;
            if record.winner.as_deref() == Some(username.as_str()) {
                player.games_won += 1;
            }
        }
        inner.games_recorded += 1;
        Ok(())
    }

    async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LeaderboardEntry> = inner
            .players
            .values()
            .map(|p| LeaderboardEntry::new(p.username.clone(), p.games_played, p.games_won))
            .collect();

        entries.sort_by(|a, b| {
            b.games_won
                .cmp(&a.games_won)
                .then(b.win_percentage.total_cmp(&a.win_percentage))
                .then_with(|| a.username.cmp(&b.username))
        });
        entries.truncate(limit as usize);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use connect4_domain::GameId;
    use serde_json::json;

    fn record(player1: &str, player2: Option<&str>, winner: Option<&str>) -> GameRecord {
        GameRecord {
            game_id: GameId::new(),
            player1: Some(player1.to_string()),
            player2: player2.map(str::to_string),
            winner: winner.map(str::to_string),
            is_draw: winner.is_none(),
            is_bot_game: player2.is_none(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            final_state: json!({}),
        }
    }

    #[tokio::test]
    async fn creating_a_player_twice_keeps_stats() {
        let store = InMemoryGameStore::new();
        store
            .record_game(record("alice", None, Some("alice")))
            .await
            .unwrap();

        let player = store.get_or_create_player("alice").await.unwrap();
        assert_eq!(player.games_played, 1);
        assert_eq!(player.games_won, 1);
        let newbie = store.get_or_create_player("newbie").await.unwrap();
        assert_eq!(newbie.games_played, 0);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_wins_then_percentage() {
        let store = InMemoryGameStore::new();
        // alice 2 of 4, bob 2 of 2, carol 0 of 1
        store
            .record_game(record("alice", Some("bob"), Some("bob")))
            .await
            .unwrap();
        store
            .record_game(record("alice", Some("bob"), Some("bob")))
            .await
            .unwrap();
        store
            .record_game(record("alice", None, Some("alice")))
            .await
            .unwrap();
        store
            .record_game(record("alice", None, Some("alice")))
            .await
            .unwrap();
        store
            .record_game(record("carol", None, None))
            .await
            .unwrap();

        let board = store.top_players(10).await.unwrap();
        let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, ["bob", "alice", "carol"]);
        assert_eq!(board[1].win_percentage, 50.0);
        assert_eq!(store.game_count().await, 5);

        assert_eq!(store.top_players(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recording_games_only_grows_player_totals() {
        let store = InMemoryGameStore::new();
        for _ in 0..50 {
            store
                .record_game(record("alice", Some("bob"), Some("alice")))
                .await
                .unwrap();
        }

        assert_eq!(store.game_count().await, 50);
        let inner = store.inner.read().await;
        assert_eq!(inner.players.len(), 2);
        assert_eq!(inner.players["alice"].games_won, 50);
        assert_eq!(inner.players["bob"].games_played, 50);
    }
}
