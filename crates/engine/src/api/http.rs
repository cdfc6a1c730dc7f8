//! HTTP routes.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;

use connect4_shared::{ActiveUser, LeaderboardEntry};

use crate::app::App;
use crate::infrastructure::ports::StoreError;

const LEADERBOARD_LIMIT: u32 = 100;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/active-users", get(active_users))
        .route("/leaderboard", get(leaderboard))
}

async fn health() -> &'static str {
    "OK"
}

async fn active_users(State(app): State<Arc<App>>) -> Json<Vec<ActiveUser>> {
    Json(app.hub.active_users().await)
}

async fn leaderboard(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let entries = app.store.top_players(LEADERBOARD_LIMIT).await?;
    Ok(Json(entries))
}

#[derive(Debug)]
pub enum ApiError {
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use connect4_domain::{ConnectionId, GameId};
    use connect4_shared::{ActiveUserStatus, GameMode};

    use crate::hub::Hub;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::config::HubConfig;
    use crate::infrastructure::events::TracingEventPublisher;
    use crate::infrastructure::memory_store::InMemoryGameStore;
    use crate::infrastructure::ports::{GameRecord, GameStore, MockGameStore};

    fn app_with(store: Arc<dyn GameStore>) -> Arc<App> {
        let hub = Hub::new(
            HubConfig::default(),
            store.clone(),
            Arc::new(TracingEventPublisher::new()),
            Arc::new(SystemClock::new()),
        );
        Arc::new(App::new(hub, store))
    }

    async fn get_json(app: Arc<App>, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = routes()
            .with_state(app)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let app = app_with(Arc::new(InMemoryGameStore::new()));
        for uri in ["/", "/api/health"] {
            let response = routes()
                .with_state(app.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"OK");
        }
    }

    #[tokio::test]
    async fn leaderboard_lists_recorded_players() {
        let store = Arc::new(InMemoryGameStore::new());
        store
            .record_game(GameRecord {
                game_id: GameId::new(),
                player1: Some("alice".to_string()),
                player2: None,
                winner: Some("alice".to_string()),
                is_draw: false,
                is_bot_game: true,
                started_at: chrono::Utc::now(),
                ended_at: chrono::Utc::now(),
                final_state: json!({}),
            })
            .await
            .unwrap();

        let (status, body) = get_json(app_with(store), "/leaderboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{"username": "alice", "gamesPlayed": 1, "gamesWon": 1, "winPercentage": 100.0}])
        );
    }

    #[tokio::test]
    async fn leaderboard_store_failure_is_a_500() {
        let mut store = MockGameStore::new();
        store
            .expect_top_players()
            .withf(|limit| *limit == LEADERBOARD_LIMIT)
            .returning(|_| Err(StoreError::database("top_players", "locked")));

        let (status, body) = get_json(app_with(Arc::new(store)), "/leaderboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal error"}));
    }

    #[tokio::test]
    async fn active_users_reports_waiting_players() {
        let app = app_with(Arc::new(InMemoryGameStore::new()));
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let alice = ConnectionId::new();
        app.hub.register(alice, tx).await;
        app.hub.join(alice, "alice".to_string(), GameMode::Friend)
            .await;

        let (status, body) = get_json(app.clone(), "/active-users").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"username": "alice", "status": "waiting"}]));

        let users = app.hub.active_users().await;
        assert_eq!(users[0].status, ActiveUserStatus::Waiting);
    }
}
