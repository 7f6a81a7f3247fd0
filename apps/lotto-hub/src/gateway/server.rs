//! WebSocket upgrade handler and per-connection loops for the hub endpoint.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time;

use crate::AppState;

use super::connection::Connection;
use super::responders;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .merge(responders::router())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_failed_upgrade(|err: axum::Error| tracing::warn!(%err, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_connection(socket, state))
}

/// Register the client, send it one personal value set, then read until
/// the socket fails or the hub closes the connection.
async fn handle_connection(socket: WebSocket, state: AppState) {
    let hub = state.hub.clone();
    let (ws_tx, mut ws_rx) = socket.split();

    let (conn, rx) = Connection::channel(state.config.send_buffer);
    let writer = tokio::spawn(run_writer(conn.clone(), rx, ws_tx, state.config.write_timeout));

    if !hub.registry().add(conn.clone()) {
        tracing::debug!(conn_id = %conn.id, "hub shutting down, refusing client");
        conn.close();
        let _ = writer.await;
        return;
    }

    tracing::info!(
        conn_id = %conn.id,
        connections = hub.registry().len(),
        "client connected"
    );

    let personal = lotto_common::draw();
    if hub.send_to(&conn, &personal).is_ok() {
        read_until_closed(&conn, &mut ws_rx).await;
    }

    hub.disconnect(&conn);
    let _ = writer.await;

    tracing::info!(
        conn_id = %conn.id,
        connections = hub.registry().len(),
        "client disconnected"
    );
}

/// Inbound frames only prove the client is alive and are discarded.
async fn read_until_closed(conn: &Connection, ws_rx: &mut SplitStream<WebSocket>) {
    loop {
        tokio::select! {
            () = conn.closed() => break,
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!(?e, conn_id = %conn.id, "ws read error");
                    break;
                }
            },
        }
    }
}

/// Sole writer for one socket. Exits on close, on a write error, or when
/// a frame misses the write deadline, and closes the connection either way.
async fn run_writer<S>(
    conn: Arc<Connection>,
    mut rx: mpsc::Receiver<Arc<str>>,
    mut ws_tx: S,
    write_timeout: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Debug,
{
    loop {
        let payload = tokio::select! {
            biased;
            () = conn.closed() => break,
            next = rx.recv() => match next {
                Some(payload) => payload,
                None => break,
            },
        };

        match time::timeout(write_timeout, ws_tx.send(Message::Text(payload.to_string().into()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(?e, conn_id = %conn.id, "ws write error");
                break;
            }
            Err(_) => {
                tracing::warn!(conn_id = %conn.id, "ws write deadline exceeded");
                break;
            }
        }
    }
    // Dropping the sink without a close frame: the client sees an abrupt disconnect.
    conn.close();
}
