// src/metrics.rs

use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

/// Install the process-wide Prometheus recorder. Call once, from `main`.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::internal(format!("failed to install Prometheus recorder: {e}")))
}

pub fn record_submission(saved: bool) {
    let outcome = if saved { "saved" } else { "rejected" };
    counter!("settings_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, path: &str, status: StatusCode, start_time: Instant) {
    let duration = start_time.elapsed().as_secs_f64();
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.as_u16().to_string()),
    ];
    counter!("settings_admin_requests_total", &labels).increment(1);
    histogram!("settings_admin_request_duration_seconds", &labels).record(duration);
}

/// Label used for requests that matched no route, so unknown URLs share one series.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Counts every request with its method, matched route template and status.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_PATH.to_string(), |p| p.as_str().to_string());

    let response = next.run(req).await;
    record_request(&method, &path, response.status(), start);
    response
}

/// Prometheus text exposition. Answers 404 when no recorder is installed.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
