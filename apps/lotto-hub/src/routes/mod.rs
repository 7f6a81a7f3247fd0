pub mod health;
pub mod hub;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest("/api/v1", hub::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        hub::hub_stats,
        hub::broadcast,
        hub::draw,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            health::HealthResponse,
            hub::StatsResponse,
            hub::BroadcastResponse,
            hub::DrawResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Hub", description = "Broadcast hub"),
    )
)]
pub struct ApiDoc;
