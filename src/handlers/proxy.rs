use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::metrics::{PERSIST_DROPPED, REQUEST_REJECTED, REQUEST_TOTAL, UPSTREAM_ERRORS, UPSTREAM_LATENCY};
use crate::models::{PersistJob, RequestRecord, ResponseRecord};
use crate::state::AppState;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// Rate limit, forward, transform, respond, then hand the exchange to the persistence queue
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ProxyError> {
    REQUEST_TOTAL.inc();

    let identity = client_identity(peer, &headers, state.trust_forwarded_for);
    if !state.rate_limiter.check_and_record(&identity) {
        REQUEST_REJECTED.inc();
        debug!(client = %identity, "Rate limit exceeded, rejecting");
        return Err(ProxyError::RateLimited);
    }

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    let request = RequestRecord {
        client: identity,
        method: method.to_string(),
        path,
        received_at: Utc::now(),
    };
    debug!(client = %request.client, path = %request.path, "Forwarding request");

    let outcome = forward(&state, &request.path).await;

    let response = match &outcome {
        Ok((status, data, _)) => ResponseRecord {
            status: status.as_u16(),
            data: Some(data.clone()),
            error: None,
            completed_at: Utc::now(),
        },
        Err(e) => {
            UPSTREAM_ERRORS.inc();
            warn!(client = %request.client, path = %request.path, error = %e, "Upstream exchange failed");
            ResponseRecord {
                status: e.status().as_u16(),
                data: None,
                error: Some(e.to_string()),
                completed_at: Utc::now(),
            }
        }
    };
    enqueue(&state, PersistJob { request, response });

    let (status, _, body) = outcome?;
    Ok((status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

// Fetch from upstream, check it's JSON, apply the transform and re-encode
async fn forward(
    state: &AppState,
    path: &str,
) -> Result<(StatusCode, Map<String, Value>, Vec<u8>), ProxyError> {
    let url = format!("{}{}", state.upstream, path);
    let start = Instant::now();

    let res = state.client.get(&url).send().await?;
    UPSTREAM_LATENCY.observe(start.elapsed().as_secs_f64());
    let status = res.status();

    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_json(&content_type) {
        return Err(ProxyError::UnexpectedContentType(content_type));
    }

    let bytes = res.bytes().await?;

    let mut data: Map<String, Value> = serde_json::from_slice(&bytes).map_err(ProxyError::Decode)?;
    state.transform.apply(&mut data);

    let body = serde_json::to_vec(&data).map_err(ProxyError::Encode)?;
    Ok((status, data, body))
}

// Never waits: a full or closed queue costs the record, not the client
fn enqueue(state: &AppState, job: PersistJob) {
    match state.persist_tx.try_send(job) {
        Ok(()) => {}
        Err(TrySendError::Full(job)) => {
            PERSIST_DROPPED.inc();
            warn!(path = %job.request.path, "Persistence queue full, dropping record");
        }
        Err(TrySendError::Closed(job)) => {
            PERSIST_DROPPED.inc();
            warn!(path = %job.request.path, "Persistence worker gone, dropping record");
        }
    }
}

/// Key used for rate limiting: the peer IP, or the first `X-Forwarded-For`
/// hop when the proxy sits behind another one we trust.
pub fn client_identity(peer: SocketAddr, headers: &HeaderMap, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }
    peer.ip().to_string()
}

// media type must be application/json, parameters are ignored
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|m| m.trim().eq_ignore_ascii_case("application/json"))
}
