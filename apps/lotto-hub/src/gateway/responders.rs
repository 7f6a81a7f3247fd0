//! Request/response WebSocket endpoints that bypass the hub.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::scrape::{CrawlTarget, PageScraper};
use crate::AppState;

/// The only inbound text the crawl endpoint acts on.
pub const CRAWL_TRIGGER: &str = "crawl";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/random", get(random_upgrade))
        .route("/ws/crawl", get(crawl_upgrade))
}

async fn random_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let shutdown = state.hub.shutdown_token();
    ws.on_failed_upgrade(|err: axum::Error| tracing::warn!(%err, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_random(socket, shutdown))
}

/// Next inbound frame, or `None` once the peer is gone or the hub shuts down.
async fn next_frame(
    socket: &mut WebSocket,
    shutdown: &CancellationToken,
) -> Option<Result<Message, axum::Error>> {
    tokio::select! {
        () = shutdown.cancelled() => None,
        msg = socket.recv() => msg,
    }
}

/// Answer every data frame with a fresh value set.
async fn handle_random(mut socket: WebSocket, shutdown: CancellationToken) {
    while let Some(msg) = next_frame(&mut socket, &shutdown).await {
        match msg {
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                let values = lotto_common::draw();
                if socket.send(Message::Text(values.to_json().into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(?e, "ws read error");
                break;
            }
        }
    }
}

async fn crawl_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let scraper = state.scraper.clone();
    let target = state.config.crawl.clone();
    let shutdown = state.hub.shutdown_token();
    ws.on_failed_upgrade(|err: axum::Error| tracing::warn!(%err, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_crawl(socket, scraper, target, shutdown))
}

/// Scrape on `crawl`, reply with the text or an empty string on failure.
async fn handle_crawl(
    mut socket: WebSocket,
    scraper: Arc<dyn PageScraper>,
    target: CrawlTarget,
    shutdown: CancellationToken,
) {
    while let Some(msg) = next_frame(&mut socket, &shutdown).await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(?e, "ws read error");
                break;
            }
        };
        if text.as_str() != CRAWL_TRIGGER {
            continue;
        }

        let reply = match scraper.scrape(&target).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(%err, url = %target.url, "crawl failed");
                String::new()
            }
        };
        if socket.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }
}
