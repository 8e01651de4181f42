//! # miniorg
//!
//! Organization management REST API: customers, departments, managers,
//! employees and the reviews customers leave for employees, stored in SQLite.
//!
//! ## Layers
//!
//! - **Handlers** validate input, check that referenced rows exist and map
//!   outcomes to status codes.
//! - **Repositories** run SQL against a borrowed connection and report
//!   failures as [`repository::RepositoryError`].
//! - **Middleware** caches successful GETs and rate limits per host.
//!
//! ## Example
//!
//! ```rust,no_run
//! use miniorg::{app, config::Config, observability::init_tracing, server::Server, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> miniorg::error::Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder().config(config.clone()).build().await?;
//!     Server::new(config).serve(app::router(state)?).await
//! }
//! ```

pub mod app;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod health;
pub mod mapping;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod ordering;
pub mod pagination;
pub mod repository;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, OutputCacheConfig, RateLimitConfig};
    pub use crate::dto::{CustomerDto, DepartmentDto, EmployeeDto, EmployeeReviewDto, ManagerDto};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, ListQuery};
    pub use crate::models::{Customer, Department, DepartmentManager, Employee, EmployeeReview, Manager};
    pub use crate::ordering::{OrderBy, OrderDirection, Sortable};
    pub use crate::pagination::Page;
    pub use crate::repository::{
        CustomerRepository, DepartmentRepository, EmployeeRepository, EmployeeReviewRepository, ManagerRepository,
        RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult,
    };
    pub use crate::server::Server;
    pub use crate::state::{AppState, AppStateBuilder};
}
