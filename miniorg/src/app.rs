//! Route assembly
//!
//! Health probes sit at the root and skip both throttling and caching. The
//! API routes are wrapped so that a request first meets the output cache and
//! only cache misses reach the rate limiter.

use axum::{middleware, routing::get, Router};

use crate::{
    error::Result,
    handlers,
    health,
    middleware::{OutputCache, RateLimit},
    state::AppState,
};

/// The full application router with state attached
pub fn router(state: AppState) -> Result<Router> {
    let config = state.config();
    let mut api = handlers::api_router();

    // Layers added later wrap the ones added earlier
    if config.rate_limit.enabled {
        let rate_limit = RateLimit::new(&config.rate_limit)?;
        api = api.layer(middleware::from_fn_with_state(rate_limit, RateLimit::middleware));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    if config.output_cache.enabled {
        let cache = OutputCache::from_config(&config.output_cache);
        api = api.layer(middleware::from_fn_with_state(cache, OutputCache::middleware));
    } else {
        tracing::info!("Output cache disabled");
    }

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .merge(api)
        .with_state(state);

    Ok(router)
}
