//! Middleware: output caching, per-host rate limiting and request tracking

pub mod output_cache;
pub mod rate_limit;
pub mod request_tracking;
mod sweep;

pub use output_cache::OutputCache;
pub use rate_limit::{RateLimit, RateLimitExceeded, RATE_LIMITED_MESSAGE};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, MakeTypedRequestId, RequestId,
    RequestIdError, SENSITIVE_HEADERS,
};
