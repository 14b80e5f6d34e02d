use axum::Router;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/server_status/", get(routes::status::server_status))
        .route("/server_players/", get(routes::status::server_players))
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .layer(CompressionLayer::new())
        // Widgets may be served from another origin than the status API.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
