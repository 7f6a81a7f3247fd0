//! Hub inspection and on-demand broadcast endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody};
use crate::gateway::fanout::Enqueued;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hub/stats", get(hub_stats))
        .route("/hub/broadcast", post(broadcast))
        .route("/draw", get(draw))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub connections: usize,
    pub queued: usize,
    pub queue_capacity: usize,
    pub dispatched: u64,
    pub pruned: u64,
    pub broadcast_interval_secs: u64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BroadcastResponse {
    #[schema(value_type = Vec<u8>, example = json!([1, 2, 3, 4, 5, 6]))]
    pub values: lotto_common::ValueSet,
    /// The queue was full and its oldest entry was evicted.
    pub dropped_oldest: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DrawResponse {
    #[schema(value_type = Vec<u8>, example = json!([1, 2, 3, 4, 5, 6]))]
    pub values: lotto_common::ValueSet,
}

// ---------------------------------------------------------------------------
// GET /api/v1/hub/stats
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/hub/stats",
    tag = "Hub",
    responses((status = 200, description = "Hub counters", body = StatsResponse)),
)]
pub async fn hub_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.hub.stats();
    Json(StatsResponse {
        connections: stats.connections,
        queued: stats.queued,
        queue_capacity: stats.queue_capacity,
        dispatched: stats.dispatched,
        pruned: stats.pruned,
        broadcast_interval_secs: state.config.broadcast_interval.as_secs(),
        started_at: state.started_at,
    })
}

// ---------------------------------------------------------------------------
// POST /api/v1/hub/broadcast
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/hub/broadcast",
    tag = "Hub",
    responses(
        (status = 202, description = "Value set queued for broadcast", body = BroadcastResponse),
        (status = 503, description = "Queue full or hub shutting down", body = ApiErrorBody),
    ),
)]
pub async fn broadcast(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<BroadcastResponse>), ApiError> {
    let values = lotto_common::draw();
    let outcome = state.hub.enqueue(values).await?;

    tracing::info!(%values, "on-demand broadcast queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(BroadcastResponse {
            values,
            dropped_oldest: outcome == Enqueued::DroppedOldest,
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/draw
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/draw",
    tag = "Hub",
    responses((status = 200, description = "A fresh value set, not broadcast", body = DrawResponse)),
)]
pub async fn draw() -> Json<DrawResponse> {
    Json(DrawResponse {
        values: lotto_common::draw(),
    })
}
