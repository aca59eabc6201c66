use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};
use tracing::{debug, info, warn};

use crate::metrics::{PERSIST_FAILURES, TRACKED_CLIENTS};
use crate::models::PersistJob;
use crate::persistence::PersistenceSink;
use crate::rate_limit::RateLimiter;

/// Background worker: drains the persistence queue one job at a time.
///
/// Exits once every sender has been dropped and the queue is empty.
pub async fn persistence_worker(mut rx: mpsc::Receiver<PersistJob>, sink: Arc<dyn PersistenceSink>) {
    info!("Persistence worker started");

    while let Some(job) = rx.recv().await {
        match sink.save(&job.request, &job.response).await {
            Ok(()) => debug!(path = %job.request.path, "Exchange persisted"),
            Err(e) => {
                PERSIST_FAILURES.inc();
                warn!(
                    client = %job.request.client,
                    path = %job.request.path,
                    error = %e,
                    "Failed to persist exchange"
                );
            }
        }
    }

    info!("Persistence worker stopped");
}

// Window sweeper - drops expired client windows on a fixed interval
pub async fn window_sweeper(rate_limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);

    info!(interval = ?every, "Window sweeper started");

    loop {
        interval.tick().await;
        rate_limiter.sweep();
        TRACKED_CLIENTS.set(rate_limiter.tracked() as f64);
    }
}
