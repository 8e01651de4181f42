//! Storage layer
//!
//! Repositories run queries and mutate rows; they never decide whether a
//! mutation is allowed. Every call takes the connection (or open transaction)
//! of the current request, so a request's reads and writes share one
//! persistence context and nothing outlives it.
//!
//! The operations every table shares (`exists`, `exists_any`, `get_all`,
//! `get_by_id`, `delete`) live on the generic [`Repository`]; the
//! entity-specific ones are inherent impls in the per-entity modules.
//!
//! # Example
//!
//! ```rust,no_run
//! use miniorg::models::Customer;
//! use miniorg::ordering::OrderBy;
//! use miniorg::repository::CustomerRepository;
//! use sqlx::SqlitePool;
//!
//! async fn newest_customers(pool: &SqlitePool) -> anyhow::Result<Vec<Customer>> {
//!     let mut conn = pool.acquire().await?;
//!     let order = OrderBy::resolve::<Customer>("id", true);
//!     Ok(CustomerRepository::get_all(&mut conn, order).await?)
//! }
//! ```

mod customer;
mod department;
mod employee;
mod error;
mod manager;
mod review;

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection};

use crate::models::{Customer, Department, Employee, EmployeeReview, Manager};
use crate::ordering::{OrderBy, Sortable};

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub(crate) use error::SqlxResultExt;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A row type stored in its own table with an integer `id` primary key
pub trait Entity: Sortable + for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table name; only ever interpolated from this constant
    const TABLE: &'static str;

    /// Entity name used in error context
    const NAME: &'static str;
}

impl Entity for Customer {
    const TABLE: &'static str = "customers";
    const NAME: &'static str = "Customer";
}

impl Entity for Department {
    const TABLE: &'static str = "departments";
    const NAME: &'static str = "Department";
}

impl Entity for Manager {
    const TABLE: &'static str = "managers";
    const NAME: &'static str = "Manager";
}

impl Entity for Employee {
    const TABLE: &'static str = "employees";
    const NAME: &'static str = "Employee";
}

impl Entity for EmployeeReview {
    const TABLE: &'static str = "employee_reviews";
    const NAME: &'static str = "EmployeeReview";
}

/// Stateless repository for entity `E`
///
/// All methods are associated functions taking the request's connection.
pub struct Repository<E>(PhantomData<E>);

pub type CustomerRepository = Repository<Customer>;
pub type DepartmentRepository = Repository<Department>;
pub type ManagerRepository = Repository<Manager>;
pub type EmployeeRepository = Repository<Employee>;
pub type EmployeeReviewRepository = Repository<EmployeeReview>;

impl<E: Entity> Repository<E> {
    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> RepositoryResult<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", E::TABLE);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .during(RepositoryOperation::Exists)?;
        Ok(count > 0)
    }

    /// True when at least one of `ids` exists. An empty slice is `false`.
    pub async fn exists_any(conn: &mut SqliteConnection, ids: &[i64]) -> RepositoryResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE id IN ({})",
            E::TABLE,
            placeholders(ids.len())
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let count = query
            .fetch_one(&mut *conn)
            .await
            .during(RepositoryOperation::Exists)?;
        Ok(count > 0)
    }

    /// Every row, ordered
    pub async fn get_all(conn: &mut SqliteConnection, order: OrderBy) -> RepositoryResult<Vec<E>> {
        let sql = format!("SELECT * FROM {} {}", E::TABLE, order.to_sql());
        sqlx::query_as::<_, E>(&sql)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// Fetch one row; a missing row is a `NotFound` error
    pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> RepositoryResult<E> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", E::TABLE);
        sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .during(RepositoryOperation::FindById)?
            .ok_or_else(|| RepositoryError::not_found(E::NAME, id))
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepositoryResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Delete, e).with_entity(E::NAME, id))?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Delete, E::NAME, id)
    }
}

/// `?, ?, ?` for an `IN` list of `n` bound values
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// A write that matched nothing is a failure
fn ensure_affected(
    rows: u64,
    operation: RepositoryOperation,
    entity: &'static str,
    id: i64,
) -> RepositoryResult<()> {
    if rows == 0 {
        Err(RepositoryError::no_rows_affected(operation, entity, id))
    } else {
        Ok(())
    }
}

/// Collapse duplicates while keeping first-seen order
fn distinct(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
