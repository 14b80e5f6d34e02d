use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use otstatus_shared::PlayersReport;
use tracing::warn;

use crate::state::AppState;

const NO_STORE: &str = "no-store";

/// TSQP info reply, at most one game-server query per minimum interval.
pub async fn server_status(State(state): State<AppState>) -> Response {
    state.observability.record_status_request();
    let cached = state
        .status_cache
        .get(state.backend.as_ref(), &state.observability)
        .await;
    json_bytes_response(Bytes::clone(&cached.json), NO_STORE)
}

pub async fn server_players(State(state): State<AppState>) -> Response {
    state.observability.record_players_request();
    let report = match state.backend.query_players().await {
        Ok(report) => report,
        Err(e) => {
            state.observability.record_players_query_failure();
            warn!(error = %e, "game server players query failed");
            PlayersReport::offline(e.to_string())
        }
    };

    match serde_json::to_vec(&report) {
        Ok(json) => json_bytes_response(Bytes::from(json), NO_STORE),
        Err(e) => {
            warn!(error = %e, "failed to serialize players report");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
