//! SQLite-backed game results and player statistics.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use connect4_shared::LeaderboardEntry;

use crate::infrastructure::ports::{ClockPort, GameRecord, GameStore, PlayerRecord, StoreError};

/// SQLite implementation of [`GameStore`].
pub struct SqliteGameStore {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteGameStore {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| StoreError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                username TEXT PRIMARY KEY,
                games_played INTEGER NOT NULL DEFAULT 0,
                games_won INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("migrate", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                player1 TEXT,
                player2 TEXT,
                winner TEXT,
                is_draw INTEGER NOT NULL,
                is_bot_game INTEGER NOT NULL,
                final_state TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::database("migrate", e))?;

        Ok(Self { pool, clock })
    }

    async fn fetch_player(&self, username: &str) -> Result<Option<PlayerRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT username, games_played, games_won FROM players WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database("fetch_player", e))?;

        Ok(row.map(|row| PlayerRecord {
            username: row.get("username"),
            games_played: count(row.get("games_played")),
            games_won: count(row.get("games_won")),
        }))
    }
}

fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[async_trait]
impl GameStore for SqliteGameStore {
    async fn get_or_create_player(&self, username: &str) -> Result<PlayerRecord, StoreError> {
        sqlx::query("INSERT OR IGNORE INTO players (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(self.clock.now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database("get_or_create_player", e))?;

        self.fetch_player(username).await?.ok_or_else(|| {
            StoreError::database("get_or_create_player", "player row missing after insert")
        })
    }

    async fn record_game(&self, record: GameRecord) -> Result<(), StoreError> {
        let final_state = serde_json::to_string(&record.final_state)
            .map_err(StoreError::serialization)?;
        let now = self.clock.now().to_rfc3339();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database("record_game", e))?;

        sqlx::query(
            r#"
            INSERT INTO games (
                id, player1, player2, winner, is_draw, is_bot_game,
                final_state, started_at, ended_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.game_id.to_string())
        .bind(&record.player1)
        .bind(&record.player2)
        .bind(&record.winner)
        .bind(record.is_draw)
        .bind(record.is_bot_game)
        .bind(final_state)
        .bind(record.started_at.to_rfc3339())
        .bind(record.ended_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::database("record_game", e))?;

        for username in [&record.player1, &record.player2].into_iter().flatten() {
            let won = record.winner.as_deref() == Some(username.as_str());
            sqlx::query(
                r#"
                INSERT INTO players (username, games_played, games_won, created_at)
                VALUES (?, 1, ?, ?)
                ON CONFLICT(username) DO UPDATE SET
                    games_played = games_played + 1,
                    games_won = games_won + excluded.games_won
                "#,
            )
            .bind(username)
            .bind(i64::from(won))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::database("record_game", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::database("record_game", e))?;

        tracing::debug!(game_id = %record.game_id, "Game recorded");
        Ok(())
    }

    async fn top_players(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT username, games_played, games_won
            FROM players
            ORDER BY games_won DESC,
                CASE WHEN games_played = 0 THEN 0.0
                     ELSE CAST(games_won AS REAL) / games_played END DESC,
                username ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database("top_players", e))?;

        Ok(rows
            .iter()
            .map(|row| {
                LeaderboardEntry::new(
                    row.get::<String, _>("username"),
                    count(row.get("games_played")),
                    count(row.get("games_won")),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use chrono::Utc;
    use connect4_domain::GameId;
    use serde_json::json;

    async fn open(dir: &tempfile::TempDir) -> SqliteGameStore {
        let path = dir.path().join("connect4.db");
        SqliteGameStore::new(path.to_str().unwrap(), Arc::new(FixedClock(Utc::now())))
            .await
            .unwrap()
    }

    fn finished(player1: &str, player2: Option<&str>, winner: Option<&str>) -> GameRecord {
        GameRecord {
            game_id: GameId::new(),
            player1: Some(player1.to_string()),
            player2: player2.map(str::to_string),
            winner: winner.map(str::to_string),
            is_draw: winner.is_none(),
            is_bot_game: player2.is_none(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            final_state: json!({"status": "completed"}),
        }
    }

    #[tokio::test]
    async fn players_are_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;

        let first = store.get_or_create_player("alice").await.unwrap();
        let again = store.get_or_create_player("alice").await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first.games_played, 0);
    }

    #[tokio::test]
    async fn bot_game_updates_only_the_human() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;

        store
            .record_game(finished("alice", None, Some("alice")))
            .await
            .unwrap();
        store
            .record_game(finished("alice", None, None))
            .await
            .unwrap();

        let alice = store.get_or_create_player("alice").await.unwrap();
        assert_eq!((alice.games_played, alice.games_won), (2, 1));

        let board = store.top_players(100).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].win_percentage, 50.0);
    }

    #[tokio::test]
    async fn leaderboard_ranks_wins_before_percentage() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;

        store
            .record_game(finished("alice", Some("bob"), Some("alice")))
            .await
            .unwrap();
        store
            .record_game(finished("alice", Some("bob"), Some("bob")))
            .await
            .unwrap();
        store
            .record_game(finished("alice", Some("bob"), Some("alice")))
            .await
            .unwrap();
        store
            .record_game(finished("carol", None, Some("carol")))
            .await
            .unwrap();

        let board = store.top_players(100).await.unwrap();
        let ranked: Vec<(&str, u32, u32)> = board
            .iter()
            .map(|e| (e.username.as_str(), e.games_played, e.games_won))
            .collect();
        // carol and bob tie on one win; carol's 100% beats bob's 33%
        assert_eq!(ranked, [("alice", 3, 2), ("carol", 1, 1), ("bob", 3, 1)]);
    }

    #[tokio::test]
    async fn data_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open(&dir).await;
            store
                .record_game(finished("dave", None, Some("dave")))
                .await
                .unwrap();
        }

        let store = open(&dir).await;
        let dave = store.get_or_create_player("dave").await.unwrap();
        assert_eq!(dave.games_won, 1);
    }
}
