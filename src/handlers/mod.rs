mod health;
mod metrics;
mod proxy;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use proxy::{JSON_CONTENT_TYPE, client_identity, proxy_handler};

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::state::AppState;

// Gateway endpoints, everything else goes upstream
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(proxy_handler)
        .with_state(state)
}
