//! rproxy - rate limiting reverse proxy
//!
//! Forwards requests to a fixed upstream JSON API, limits each client to a
//! number of requests per window, injects configured fields into the JSON
//! response and hands every exchange to a persistence sink off the request
//! path.

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod rate_limit;
pub mod state;
pub mod transform;
pub mod worker;
