//! Database connection pool management

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::{config::DatabaseConfig, error::Result};

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Longest wait between two connection attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Create a SQLite connection pool with retry logic
///
/// Retries use exponential backoff starting at `retry_delay_secs`, capped at
/// [`MAX_RETRY_DELAY`].
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries.saturating_add(1),
                        e
                    );
                    return Err(e);
                }

                let delay = retry_delay(base_delay, attempt);

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Backoff before retry number `attempt` (1-based)
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Apply embedded migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs));

    // An in-memory database lives only as long as its connection
    if is_in_memory(&config.url) {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await.map_err(|e| {
        crate::error::Error::Internal(format!(
            "Failed to open database at '{}': {} ({})",
            config.url,
            categorize_db_error(&e),
            e
        ))
    })?;

    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Categorize database error for better operator guidance
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "Configuration error - check the sqlite:// URL",
        Error::Database(_) => "Database error - check file permissions and mode=rwc",
        Error::Io(_) => "I/O error - check that the directory exists",
        Error::PoolTimedOut => "Connection pool timeout",
        Error::PoolClosed => "Connection pool closed",
        _ => "Connection error",
    }
}

/// Migrated in-memory pool shared by repository and handler tests
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = create_pool(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles_then_caps() {
        let base = Duration::from_secs(2);
        assert_eq!(retry_delay(base, 1), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 3), Duration::from_secs(8));
        assert_eq!(retry_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(base, u32::MAX), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(Duration::ZERO, 50), Duration::ZERO);
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://miniorg.db?mode=rwc"));
    }

    #[tokio::test]
    async fn test_create_pool_and_migrate() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite%' AND name NOT LIKE '%sqlx%' \
             ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "customers",
                "department_managers",
                "departments",
                "employee_reviews",
                "employees",
                "managers",
            ]
        );
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query("INSERT INTO department_managers (department_id, manager_id) VALUES (99, 99)")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bad_url_fails_without_retries() {
        let config = DatabaseConfig {
            url: "postgres://not-sqlite".to_string(),
            ..DatabaseConfig::in_memory()
        };
        assert!(create_pool(&config).await.is_err());
    }
}
