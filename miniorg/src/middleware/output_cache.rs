//! Output cache for successful GET responses
//!
//! Entries are keyed by method, path and query string and live for a fixed
//! TTL. Detail routes (a single entity by id, an employee's department, a
//! customer by full name) get the longer detail TTL. Writes never invalidate.
//!
//! An expired entry is dropped when its key is looked up, and every store
//! sweeps all expired entries at most once per TTL. Once the cache holds
//! `max_entries` live responses, new ones are served but not stored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use super::sweep::Sweep;
use crate::config::OutputCacheConfig;

/// Only routes below this prefix are cached
pub const CACHED_PREFIX: &str = "/api";

/// Entry limit when none is configured
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CachedResponse {
    headers: HeaderMap,
    body: Bytes,
    expires_at: Instant,
}

impl CachedResponse {
    fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Output cache middleware state
#[derive(Clone)]
pub struct OutputCache {
    entries: Arc<DashMap<String, CachedResponse>>,
    default_ttl: Duration,
    detail_ttl: Duration,
    max_entries: usize,
    sweep: Arc<Sweep>,
}

impl OutputCache {
    pub fn new(default_ttl: Duration, detail_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            default_ttl,
            detail_ttl,
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep: Arc::new(Sweep::new(default_ttl.min(detail_ttl))),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn from_config(config: &OutputCacheConfig) -> Self {
        Self::new(config.default_ttl(), config.detail_ttl()).with_max_entries(config.max_entries)
    }

    /// TTL for a request path
    pub fn ttl_for(&self, path: &str) -> Duration {
        if is_detail_route(path) {
            self.detail_ttl
        } else {
            self.default_ttl
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<Response> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                return Some(entry.to_response());
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        tracing::trace!(key, "Evicted expired cache entry");
        None
    }

    fn store(&self, key: String, headers: HeaderMap, body: Bytes, ttl: Duration) {
        let now = Instant::now();
        if self.sweep.due() || self.entries.len() >= self.max_entries {
            self.evict_expired(now);
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            tracing::debug!(key = %key, max_entries = self.max_entries, "Output cache full, not storing");
            return;
        }

        let entry = CachedResponse {
            headers,
            body,
            expires_at: now + ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Drop every entry that has outlived its TTL
    pub fn evict_expired(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "Swept output cache");
        }
    }

    /// Middleware function serving and filling the cache
    pub async fn middleware(State(cache): State<Self>, request: Request<Body>, next: Next) -> Response {
        if request.method() != Method::GET || !request.uri().path().starts_with(CACHED_PREFIX) {
            return next.run(request).await;
        }

        let key = cache_key(&request);
        if let Some(hit) = cache.lookup(&key) {
            tracing::debug!(key = %key, "Output cache hit");
            return hit;
        }

        let ttl = cache.ttl_for(request.uri().path());
        let response = next.run(request).await;
        if response.status() != StatusCode::OK {
            return response;
        }

        let (parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(key = %key, "Failed to buffer response for caching: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        cache.store(key, parts.headers.clone(), bytes.clone(), ttl);
        Response::from_parts(parts, Body::from(bytes))
    }
}

fn cache_key(request: &Request<Body>) -> String {
    let uri = request.uri();
    match uri.query() {
        Some(query) => format!("{} {}?{}", request.method(), uri.path(), query),
        None => format!("{} {}", request.method(), uri.path()),
    }
}

/// `/api/<Entity>/{id}`, `/api/Employee/{id}/Department` and
/// `/api/Customer/GetByFullName`
fn is_detail_route(path: &str) -> bool {
    let Some(rest) = path.strip_prefix(CACHED_PREFIX) else {
        return false;
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [_, id] if id.parse::<i64>().is_ok() => true,
        ["Employee", id, "Department"] => id.parse::<i64>().is_ok(),
        ["Customer", "GetByFullName"] => true,
        _ => false,
    }
}
