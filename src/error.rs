//! Error types for the proxy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Everything that can end a proxied exchange early.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Client exhausted its window
    #[error("too many requests")]
    RateLimited,

    /// Upstream could not be reached or its body could not be read
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Upstream answered with something other than JSON
    #[error("unexpected content-type: {0}")]
    UnexpectedContentType(String),

    /// Upstream body was not a JSON object
    #[error("invalid upstream JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// Transformed payload could not be serialized back
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failures while storing request/response records. Never reach a client.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429() {
        assert_eq!(ProxyError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        let response = ProxyError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn upstream_problems_map_to_500() {
        let err = ProxyError::UnexpectedContentType("text/html".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "unexpected content-type: text/html");

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            ProxyError::Decode(decode).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
