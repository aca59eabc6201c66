use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::error;

use crate::metrics::TRACKED_CLIENTS;
use crate::state::AppState;

// Prometheus text exposition
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    TRACKED_CLIENTS.set(state.rate_limiter.tracked() as f64);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }
    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}
