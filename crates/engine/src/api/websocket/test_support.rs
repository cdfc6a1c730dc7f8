use super::*;

use std::{net::SocketAddr, time::Duration};

use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use connect4_shared::{ServerMessage, WireStatus};

use crate::hub::Hub;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::HubConfig;
use crate::infrastructure::events::TracingEventPublisher;
use crate::infrastructure::memory_store::InMemoryGameStore;

pub(crate) type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// App backed by memory with a shallow, quick bot.
pub(crate) fn test_app() -> Arc<App> {
    let store = Arc::new(InMemoryGameStore::new());
    let config = HubConfig {
        bot_move_delay: Duration::from_millis(10),
        bot_search_depth: 2,
        ..HubConfig::default()
    };
    let hub = Hub::new(
        config,
        store.clone(),
        Arc::new(TracingEventPublisher::new()),
        Arc::new(SystemClock::new()),
    );
    Arc::new(App::new(hub, store))
}

pub(crate) async fn spawn_ws_server(app: Arc<App>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(app));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

pub(crate) async fn ws_send_client(ws: &mut WsClient, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json)).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut WsClient, text: &str) {
    ws.send(WsMessage::Text(text.to_string())).await.unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut WsClient) -> ServerFrame {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerFrame>(&text).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin).unwrap();
                return serde_json::from_str::<ServerFrame>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) -> ServerFrame
where
    F: FnMut(&ServerFrame) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let frame = ws_recv_server(ws).await;
            if predicate(&frame) {
                return frame;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut WsClient,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerFrame) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let frame = ws_recv_server(ws).await;
            if predicate(&frame) {
                panic!("unexpected message: {:?}", frame);
            }
        }
    })
    .await;

    assert!(result.is_err());
}

/// Wait until the server ends the connection.
pub(crate) async fn ws_expect_closed(ws: &mut WsClient, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(WsMessage::Close(_))) => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) fn is_in_progress(frame: &ServerFrame) -> bool {
    matches!(
        &frame.message,
        ServerMessage::GameState(state) if state.status == WireStatus::InProgress
    )
}
