//! Per-host rate limiting
//!
//! A GCRA bucket per `Host` header value, held in memory by `governor`.
//! Requests without a `Host` header share one anonymous partition. Rejected
//! requests are not queued. Partitions whose bucket has fully refilled are
//! pruned at most once per refill period.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};

use super::sweep::Sweep;
use crate::config::RateLimitConfig;
use crate::error::{Error, Result};

/// Body sent with every 429
pub const RATE_LIMITED_MESSAGE: &str = "You have been ratelimited! Please do keep in mind our 3 requests per second limit. \
Read about ratelimits here https://www.cloudflare.com/en-gb/learning/bots/what-is-rate-limiting/";

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting middleware state
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<KeyedLimiter>,
    clock: DefaultClock,
    sweep: Arc<Sweep>,
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub retry_after: Duration,
}

impl RateLimitExceeded {
    /// Whole seconds to wait, rounded up and never below one
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs()));
        response
    }
}

impl RateLimit {
    /// Build a limiter from configuration
    ///
    /// Fails when either the refill rate or the burst size is zero.
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        let per_second = NonZeroU32::new(config.per_second)
            .ok_or_else(|| Error::InvalidConfig("rate_limit.per_second must be greater than zero".into()))?;
        let burst = NonZeroU32::new(config.burst_size)
            .ok_or_else(|| Error::InvalidConfig("rate_limit.burst_size must be greater than zero".into()))?;

        let quota = Quota::per_second(per_second).allow_burst(burst);
        tracing::debug!(per_second = config.per_second, burst = config.burst_size, "Rate limiter configured");

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
            sweep: Arc::new(Sweep::new(quota.burst_size_replenished_in())),
        })
    }

    /// Take one token from `host`'s bucket
    pub fn check(&self, host: &str) -> std::result::Result<(), RateLimitExceeded> {
        if self.sweep.due() {
            self.prune();
        }

        self.limiter.check_key(&host.to_string()).map_err(|not_until| RateLimitExceeded {
            retry_after: not_until.wait_time_from(self.clock.now()),
        })
    }

    /// Forget partitions that are back to a full bucket
    pub fn prune(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        let pruned = before.saturating_sub(self.limiter.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.limiter.len(), "Pruned idle rate limit partitions");
        }
    }

    /// Number of partitions currently tracked
    pub fn partitions(&self) -> usize {
        self.limiter.len()
    }

    /// Middleware function to enforce the limit
    pub async fn middleware(State(rate_limit): State<Self>, request: Request<Body>, next: Next) -> Response {
        let host = partition_key(&request);

        match rate_limit.check(&host) {
            Ok(()) => next.run(request).await,
            Err(exceeded) => {
                tracing::warn!(
                    host = %host,
                    path = %request.uri().path(),
                    retry_after_secs = exceeded.retry_after_secs(),
                    "Rate limit exceeded"
                );
                exceeded.into_response()
            }
        }
    }
}

/// The `Host` header, or the URI authority for absolute-form requests
fn partition_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}
