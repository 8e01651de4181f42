use sqlx::SqliteConnection;

use super::{ensure_affected, CustomerRepository, RepositoryOperation, RepositoryResult, SqlxResultExt};
use crate::models::Customer;

impl CustomerRepository {
    /// Exact match on both names; the lowest id wins when several match
    pub async fn get_by_full_name(
        conn: &mut SqliteConnection,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Option<Customer>> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE first_name = ? AND last_name = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&mut *conn)
        .await
        .during(RepositoryOperation::FindAll)
    }

    /// Insert and return the stored row; `customer.id` is ignored
    pub async fn create(conn: &mut SqliteConnection, customer: Customer) -> RepositoryResult<Customer> {
        let result = sqlx::query("INSERT INTO customers (first_name, last_name) VALUES (?, ?)")
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Create)?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            ..customer
        })
    }

    pub async fn update(conn: &mut SqliteConnection, customer: &Customer) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE customers SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .bind(customer.id)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Update)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "Customer", customer.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::ordering::OrderBy;
    use crate::repository::RepositoryErrorKind;

    fn customer(first: &str, last: &str) -> Customer {
        Customer {
            id: 0,
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = CustomerRepository::create(&mut conn, Customer { id: 99, ..customer("Ann", "Lee") })
            .await
            .unwrap();
        let second = CustomerRepository::create(&mut conn, customer("Bob", "Ray")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(CustomerRepository::get_by_id(&mut conn, 1).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_get_by_full_name_prefers_lowest_id() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        CustomerRepository::create(&mut conn, customer("Kim", "Park")).await.unwrap();
        CustomerRepository::create(&mut conn, customer("Ann", "Lee")).await.unwrap();
        CustomerRepository::create(&mut conn, customer("Ann", "Lee")).await.unwrap();

        let found = CustomerRepository::get_by_full_name(&mut conn, "Ann", "Lee")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 2);

        let missing = CustomerRepository::get_by_full_name(&mut conn, "ann", "lee").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_names() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut stored = CustomerRepository::create(&mut conn, customer("Ann", "Lee")).await.unwrap();
        stored.last_name = "Leigh".to_string();
        CustomerRepository::update(&mut conn, &stored).await.unwrap();

        let reloaded = CustomerRepository::get_by_id(&mut conn, stored.id).await.unwrap();
        assert_eq!(reloaded.last_name, "Leigh");

        let ghost = Customer { id: 77, ..stored };
        let err = CustomerRepository::update(&mut conn, &ghost).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NoRowsAffected);
    }

    #[tokio::test]
    async fn test_name_order_ignores_case() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        CustomerRepository::create(&mut conn, customer("Ann", "Clark")).await.unwrap();
        CustomerRepository::create(&mut conn, customer("Bob", "adams")).await.unwrap();
        CustomerRepository::create(&mut conn, customer("Cat", "Baker")).await.unwrap();

        let sorted = CustomerRepository::get_all(&mut conn, OrderBy::resolve::<Customer>("lastName", false))
            .await
            .unwrap();
        let names: Vec<&str> = sorted.iter().map(|c| c.last_name.as_str()).collect();
        assert_eq!(names, vec!["adams", "Baker", "Clark"]);
    }
}
