//! Policy layer
//!
//! Handlers validate input, check that every referenced entity exists, call
//! the repositories and translate the outcome into a status code. All
//! business rules live here: deletion guards, no-op detection, id checks.
//!
//! Each resource module exposes a `routes()` router; [`api_router`] nests
//! them under `/api/<Entity>`.
//!
//! # Example
//!
//! ```rust,no_run
//! use miniorg::{config::Config, handlers, state::AppState};
//!
//! # async fn run() -> miniorg::error::Result<()> {
//! let state = AppState::builder().config(Config::for_tests()).build().await?;
//! let app: axum::Router = handlers::api_router().with_state(state);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

mod customer;
mod department;
mod employee;
mod error;
mod extract;
mod manager;
mod query;
mod review;

use axum::Router;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};

use crate::repository::{Entity, Repository, RepositoryError, RepositoryResult};
use crate::state::AppState;

pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use query::{id_list, linked_ids, ListQuery, DEFAULT_PAGE_SIZE, MAX_LINKED_IDS};

/// All resource routes, nested under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/Customer", customer::routes())
        .nest("/api/Department", department::routes())
        .nest("/api/Manager", manager::routes())
        .nest("/api/Employee", employee::routes())
        .nest("/api/EmployeeReview", review::routes())
}

/// Map a storage failure to a generic 500 for `operation`
pub(crate) trait OrPersistence<T> {
    fn or_persistence(self, operation: ApiOperation) -> Result<T, ApiError>;
}

impl<T> OrPersistence<T> for RepositoryResult<T> {
    fn or_persistence(self, operation: ApiOperation) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::persistence(operation, e))
    }
}

/// Check out a connection for the lifetime of the request
pub(crate) async fn connection(state: &AppState, operation: ApiOperation) -> Result<PoolConnection<Sqlite>, ApiError> {
    state.db().acquire().await.map_err(|e| {
        ApiError::persistence(
            operation,
            RepositoryError::from_sqlx(crate::repository::RepositoryOperation::Transaction, e),
        )
    })
}

/// 404 unless a row of `E` with `id` exists
pub(crate) async fn ensure_exists<E: Entity>(
    conn: &mut SqliteConnection,
    id: i64,
    operation: ApiOperation,
) -> Result<(), ApiError> {
    if Repository::<E>::exists(conn, id).await.or_persistence(operation)? {
        Ok(())
    } else {
        tracing::warn!(entity = E::NAME, id, %operation, "Referenced entity does not exist");
        Err(ApiError::not_found(E::NAME, id).with_operation(operation))
    }
}

/// Validate a request body
pub(crate) fn validated<T: validator::Validate>(body: T, operation: ApiOperation) -> Result<T, ApiError> {
    body.validate()
        .map_err(|e| ApiError::validation(&e).with_operation(operation))?;
    Ok(body)
}
