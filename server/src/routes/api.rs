use std::fmt::Write as _;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cached = state.status_cache.peek().await;
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "status_cached": cached.is_some(),
        "game_server_online": cached.as_ref().map(|c| c.report.online),
        "status_updated_at": cached.as_ref().map(|c| c.updated_at.to_rfc3339()),
        "status_cache_age_secs": cached.as_ref().map(|c| c.refreshed_at.elapsed().as_secs()),
        "observability": {
            "status_requests_total": observability.status_requests_total,
            "status_cache_hits_total": observability.status_cache_hits_total,
            "status_refreshes_total": observability.status_refreshes_total,
            "status_query_failures_total": observability.status_query_failures_total,
            "players_requests_total": observability.players_requests_total,
            "players_query_failures_total": observability.players_query_failures_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let game_server_online = state
        .status_cache
        .peek()
        .await
        .is_some_and(|cached| cached.report.online);
    let observability = state.observability.snapshot();

    let body = render_prometheus_metrics(game_server_online, observability);

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    game_server_online: bool,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP otstatus_game_server_online Whether the last cached status reply was online (1 or 0)."
    );
    let _ = writeln!(body, "# TYPE otstatus_game_server_online gauge");
    let _ = writeln!(
        body,
        "otstatus_game_server_online {}",
        u8::from(game_server_online)
    );

    let counters = [
        (
            "otstatus_status_requests_total",
            "Total /server_status/ requests served.",
            observability.status_requests_total,
        ),
        (
            "otstatus_status_cache_hits_total",
            "Total /server_status/ requests answered from the cache.",
            observability.status_cache_hits_total,
        ),
        (
            "otstatus_status_refreshes_total",
            "Total TSQP info queries sent to the game server.",
            observability.status_refreshes_total,
        ),
        (
            "otstatus_status_query_failures_total",
            "Total TSQP info queries that failed after all retries.",
            observability.status_query_failures_total,
        ),
        (
            "otstatus_players_requests_total",
            "Total /server_players/ requests served.",
            observability.players_requests_total,
        ),
        (
            "otstatus_players_query_failures_total",
            "Total player-list queries that failed after all retries.",
            observability.players_query_failures_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }

    body
}
