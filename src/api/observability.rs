use crate::api::AppState;
use axum::{
    Json,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.store().ping().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Database unavailable" })),
            )
                .into_response()
        }
    }
}

/// Records request counters and latency histograms per matched route.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().to_string();
    // Use the route template to avoid one series per army id
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_string(), |mp| mp.as_str().to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();

    let labels = [
        ("method", method),
        ("path", path),
        ("status", status.to_string()),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());

    let outcome = if status >= 500 {
        "error"
    } else if status >= 400 {
        "client_error"
    } else {
        "success"
    };

    info!(
        event = "http_request_finished",
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        status_code = status,
        outcome = %outcome,
        "Request finished"
    );

    response
}
