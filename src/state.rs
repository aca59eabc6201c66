use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::{Args, MAX_PERSIST_QUEUE};
use crate::models::PersistJob;
use crate::rate_limit::{RateLimiter, WindowMode};
use crate::transform::Transform;

// app's shared state
pub struct AppState {
    pub client: reqwest::Client,
    pub upstream: String,                   // base url, no trailing slash
    pub rate_limiter: Arc<RateLimiter>,
    pub transform: Transform,               // fields injected into every response
    pub trust_forwarded_for: bool,
    pub persist_tx: mpsc::Sender<PersistJob>,
}

impl AppState {
    /// Build state from CLI arguments. The receiving half of the persistence
    /// queue goes to whoever runs the persistence worker.
    pub fn from_args(args: &Args) -> reqwest::Result<(Self, mpsc::Receiver<PersistJob>)> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(args.upstream_timeout))
            .build()?;

        let mode = if args.strict_window {
            WindowMode::Fixed
        } else {
            WindowMode::Refreshing
        };
        let rate_limiter = RateLimiter::new(args.rate_limit, Duration::from_secs(args.rate_window))
            .with_mode(mode);

        // clap bounds the flag, this covers Args built by hand
        let capacity = usize::try_from(args.persist_queue.clamp(1, MAX_PERSIST_QUEUE)).unwrap_or(1);
        let (persist_tx, persist_rx) = mpsc::channel(capacity);

        let state = Self {
            client,
            upstream: normalize_upstream(&args.upstream),
            rate_limiter: Arc::new(rate_limiter),
            transform: args.transform(),
            trust_forwarded_for: args.trust_forwarded_for,
            persist_tx,
        };
        Ok((state, persist_rx))
    }
}

// add http:// if not present, drop trailing slashes
pub fn normalize_upstream(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
