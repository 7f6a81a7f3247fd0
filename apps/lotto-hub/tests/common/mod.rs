#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

use lotto_hub::config::Config;
use lotto_hub::scrape::{CrawlTarget, PageScraper, ScrapeError};
use lotto_hub::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const WAIT: Duration = Duration::from_secs(5);

/// Scraper returning a canned reply without touching the network.
pub struct StubScraper {
    pub reply: Option<String>,
}

#[async_trait]
impl PageScraper for StubScraper {
    async fn scrape(&self, target: &CrawlTarget) -> Result<String, ScrapeError> {
        self.reply
            .clone()
            .ok_or_else(|| ScrapeError::NotFound(target.selector.clone()))
    }
}

/// Config with a producer interval long enough to stay out of the way.
pub fn test_config() -> Config {
    Config {
        broadcast_interval: Duration::from_secs(3600),
        write_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

pub fn test_state() -> AppState {
    test_state_with_scraper(StubScraper {
        reply: Some("stub page text".to_string()),
    })
}

pub fn test_state_with_scraper(scraper: StubScraper) -> AppState {
    AppState::new(test_config(), Arc::new(scraper))
}

pub fn test_app(state: &AppState) -> Router {
    lotto_hub::routes::router().with_state(state.clone())
}

/// Start a real TCP server for WebSocket testing. Runs in the background.
pub async fn start_ws_server(state: &AppState) -> SocketAddr {
    let app = test_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn connect(addr: SocketAddr, path: &str) -> WsClient {
    let url = format!("ws://{addr}{path}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Next text frame, skipping control frames.
pub async fn next_text(ws: &mut WsClient) -> String {
    loop {
        let msg = time::timeout(WAIT, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");
        match msg {
            tungstenite::Message::Text(text) => return text.as_str().to_string(),
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("expected text frame, got: {other:?}"),
        }
    }
}

/// Wait until the hub registry holds exactly `n` connections.
pub async fn wait_for_connections(state: &AppState, n: usize) {
    time::timeout(WAIT, async {
        while state.hub.registry().len() != n {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {n} connections, registry has {}",
            state.hub.registry().len()
        )
    });
}
