// Shared helpers for integration tests: one server per test binary plus small WebSocket utilities.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use session_server::ServerSettings;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Base URL of the server shared by every test in a binary.
static SERVER_URL: OnceLock<String> = OnceLock::new();

/// Starts the shared default server on first use and returns its `http://host:port` base URL.
pub fn ensure_server() -> &'static str {
    SERVER_URL.get_or_init(|| spawn_server(None)).as_str()
}

/// Starts a dedicated server and returns its base URL. `None` runs with defaults; tests that need
/// short intervals or tiny queues pass their own settings.
pub fn spawn_server(settings: Option<ServerSettings>) -> String {
    let published_url = Arc::new(OnceLock::<String>::new());
    let published_url_thread = Arc::clone(&published_url);
    // The server gets its own OS thread and runtime so it outlives each `#[tokio::test]`.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = published_url_thread.set(format!("http://{}", addr));
            let served = match settings {
                Some(settings) => session_server::run_with_settings(listener, settings, None).await,
                None => session_server::run(listener).await,
            };
            served.expect("server failed");
        });
    });
    wait_for_server_url_and_readiness(published_url)
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) -> String {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return base_url;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

pub fn ws_url(base_url: &str) -> String {
    format!("ws://{}/ws", base_url.trim_start_matches("http://"))
}

/// Connects to the shared default server.
pub async fn connect() -> Ws {
    connect_to(ensure_server()).await
}

pub async fn connect_to(base_url: &str) -> Ws {
    let (ws, _response) = connect_async(ws_url(base_url))
        .await
        .expect("websocket connect");
    ws
}

pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send frame");
}

/// Reads frames until one satisfies `matches`, skipping traffic from other tests on the shared
/// server. Panics if nothing matches within a few seconds.
pub async fn next_matching(ws: &mut Ws, matches: impl Fn(&Value) -> bool) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let frame = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(text.as_str()).expect("server sent json");
            if matches(&value) {
                return value;
            }
        }
    }
}

pub async fn next_of_type(ws: &mut Ws, kind: &str) -> Value {
    next_matching(ws, |v| v["type"] == kind).await
}

/// Joins under `name` at (x, y) and returns the server-assigned player id.
pub async fn join(ws: &mut Ws, name: &str, x: f64, y: f64) -> String {
    send_json(
        ws,
        serde_json::json!({"type": "join", "name": name, "x": x, "y": y}),
    )
    .await;
    let me = next_of_type(ws, "your_player").await;
    me["id"].as_str().expect("player id").to_string()
}

pub fn unique_name() -> String {
    // Display names are capped at 32 characters.
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("t-{}", &id[..12])
}

/// Whether the player shows up in the `/world/state` polling payload.
pub async fn is_present(base_url: &str, player_id: &str) -> bool {
    let body: Value = reqwest::get(format!("{base_url}/world/state"))
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    body["players"]
        .as_array()
        .is_some_and(|players| players.iter().any(|p| p["id"] == player_id))
}
