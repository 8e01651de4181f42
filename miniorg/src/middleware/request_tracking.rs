//! Request ids and header hygiene
//!
//! Every request gets an `x-request-id` unless the client sent one; the id is
//! echoed on the response and shows up in the trace span. Generated ids use
//! the TypeID format with a `req` prefix over a UUIDv7, e.g.
//! `req_01h455vb4pex5vsknk084sn02q`, so they sort by creation time.

use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderName, HeaderValue, Request};
use mti::prelude::*;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId as TowerRequestId, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

/// Headers masked in logs
pub const SENSITIVE_HEADERS: [HeaderName; 3] = [
    axum::http::header::AUTHORIZATION,
    axum::http::header::COOKIE,
    HeaderName::from_static("x-api-key"),
];

/// A time-sortable request identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    pub const PREFIX: &'static str = "req";

    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = RequestIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = MagicTypeId::from_str(s).map_err(RequestIdError::Parse)?;
        if id.prefix().as_str() != Self::PREFIX {
            return Err(RequestIdError::InvalidPrefix(id.prefix().as_str().to_string()));
        }
        Ok(Self(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestIdError {
    #[error("failed to parse request ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    #[error("invalid request ID prefix '{0}', expected 'req'")]
    InvalidPrefix(String),
}

/// Generates a [`RequestId`] for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let value = HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(value))
    }
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::x_request_id(MakeTypedRequestId)
}

pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::{ServiceBuilder, ServiceExt};

    #[test]
    fn test_request_id_format() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        assert_eq!(id.as_str().len(), 30);

        let parsed: RequestId = id.as_str().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_request_id_rejects_other_prefixes() {
        let other = "user".create_type_id::<V7>();
        assert!(matches!(
            other.as_str().parse::<RequestId>(),
            Err(RequestIdError::InvalidPrefix(prefix)) if prefix == "user"
        ));
        assert!("not an id".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = RequestId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = RequestId::new();
        assert!(first.as_str() < second.as_str());
    }

    fn router() -> Router {
        Router::new().route("/ping", get(|| async { "pong" })).layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(request_id_propagation_layer()),
        )
    }

    #[tokio::test]
    async fn test_generated_id_is_echoed() {
        let response = router()
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(id.parse::<RequestId>().is_ok());
    }

    #[tokio::test]
    async fn test_client_id_is_kept() {
        let response = router()
            .oneshot(
                Request::get("/ping")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
