use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("rproxy_requests_total", "Total number of proxied requests").unwrap();
    pub static ref REQUEST_REJECTED: Counter =
        register_counter!("rproxy_requests_rejected_total", "Requests refused by the rate limiter").unwrap();
    pub static ref UPSTREAM_ERRORS: Counter =
        register_counter!("rproxy_upstream_errors_total", "Failed upstream exchanges").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "rproxy_upstream_latency_seconds",
        "Upstream round trip in seconds"
    )
    .unwrap();
    pub static ref PERSIST_FAILURES: Counter =
        register_counter!("rproxy_persist_failures_total", "Records the sink failed to store").unwrap();
    pub static ref PERSIST_DROPPED: Counter =
        register_counter!("rproxy_persist_dropped_total", "Records dropped because the queue was full").unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("rproxy_tracked_clients", "Client windows currently held by the rate limiter").unwrap();
}
