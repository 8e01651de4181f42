//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{config::Config, database, error::Result};

/// Application state shared across handlers
///
/// Cloning is cheap: the config sits behind an `Arc` and the pool is
/// reference counted internally.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
}

impl AppState {
    /// Wrap an already connected pool
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        Self {
            config: Arc::new(config),
            pool,
        }
    }

    /// Create a new builder for AppState
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Builder for AppState
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    pool: Option<SqlitePool>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use this pool instead of connecting from config
    pub fn db_pool(mut self, pool: SqlitePool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Build the AppState
    ///
    /// Connects to the configured database unless a pool was supplied, then
    /// applies migrations when `database.run_migrations` is set.
    pub async fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();

        let pool = match self.pool {
            Some(pool) => pool,
            None => database::create_pool(&config.database).await?,
        };

        if config.database.run_migrations {
            database::run_migrations(&pool).await?;
        }

        Ok(AppState::new(config, pool))
    }
}
