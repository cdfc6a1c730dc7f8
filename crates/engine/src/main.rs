//! Connect4 Engine - Main entry point.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connect4_engine::api;
use connect4_engine::hub::Hub;
use connect4_engine::infrastructure::{
    clock::SystemClock,
    config::{AppConfig, CorsOrigins},
    events::TracingEventPublisher,
    memory_store::InMemoryGameStore,
    ports::{ClockPort, GameStore},
    store::SqliteGameStore,
};
use connect4_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `cargo run` may start from `crates/engine`; .env files live at the repo root.
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connect4_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Connect4 Engine");

    let config = AppConfig::from_env()?;
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    let store: Arc<dyn GameStore> = match &config.database_path {
        Some(path) => {
            tracing::info!(path = %path, "Using SQLite results store");
            Arc::new(SqliteGameStore::new(path, clock.clone()).await?)
        }
        None => {
            tracing::warn!("DATABASE_PATH not set, results are kept in memory only");
            Arc::new(InMemoryGameStore::new())
        }
    };

    let hub = Hub::new(
        config.hub.clone(),
        store.clone(),
        Arc::new(TracingEventPublisher::new()),
        clock,
    );
    let app = Arc::new(App::new(hub, store));

    let mut router = api::http::routes()
        .with_state(app.clone())
        .route("/ws", get(api::websocket::ws_handler).with_state(app))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = config.cors.as_ref().and_then(build_cors_layer) {
        router = router.layer(cors);
    }

    let addr = config.listen_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Connect4 Engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(origins: &CorsOrigins) -> Option<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    match origins {
        CorsOrigins::Any => Some(cors.allow_origin(Any)),
        CorsOrigins::List(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|s| HeaderValue::from_str(s).ok())
                .collect();
            if origins.is_empty() {
                return None;
            }
            Some(cors.allow_origin(origins))
        }
    }
}
