use sqlx::SqliteConnection;

use super::{ensure_affected, EmployeeReviewRepository, RepositoryOperation, RepositoryResult, SqlxResultExt};
use crate::models::EmployeeReview;
use crate::ordering::OrderBy;

impl EmployeeReviewRepository {
    pub async fn get_by_customer(
        conn: &mut SqliteConnection,
        customer_id: i64,
        order: OrderBy,
    ) -> RepositoryResult<Vec<EmployeeReview>> {
        let sql = format!("SELECT * FROM employee_reviews WHERE customer_id = ? {}", order.to_sql());
        sqlx::query_as::<_, EmployeeReview>(&sql)
            .bind(customer_id)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    pub async fn get_for_employee(
        conn: &mut SqliteConnection,
        employee_id: i64,
        order: OrderBy,
    ) -> RepositoryResult<Vec<EmployeeReview>> {
        let sql = format!("SELECT * FROM employee_reviews WHERE employee_id = ? {}", order.to_sql());
        sqlx::query_as::<_, EmployeeReview>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// Ratings in `min..=max`
    pub async fn get_by_rating_range(
        conn: &mut SqliteConnection,
        min: i32,
        max: i32,
        order: OrderBy,
    ) -> RepositoryResult<Vec<EmployeeReview>> {
        let sql = format!(
            "SELECT * FROM employee_reviews WHERE rating BETWEEN ? AND ? {}",
            order.to_sql()
        );
        sqlx::query_as::<_, EmployeeReview>(&sql)
            .bind(min)
            .bind(max)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// Insert a review of `employee_id` written by `customer_id`
    pub async fn create(
        conn: &mut SqliteConnection,
        customer_id: i64,
        employee_id: i64,
        review: EmployeeReview,
    ) -> RepositoryResult<EmployeeReview> {
        let result = sqlx::query(
            "INSERT INTO employee_reviews (rating, title, content, employee_id, customer_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.content)
        .bind(employee_id)
        .bind(customer_id)
        .execute(&mut *conn)
        .await
        .during(RepositoryOperation::Create)?;

        Ok(EmployeeReview {
            id: result.last_insert_rowid(),
            employee_id,
            customer_id,
            ..review
        })
    }

    /// Replace rating, title and content; references never change
    pub async fn update(conn: &mut SqliteConnection, review: &EmployeeReview) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE employee_reviews SET rating = ?, title = ?, content = ? WHERE id = ?")
            .bind(review.rating)
            .bind(&review.title)
            .bind(&review.content)
            .bind(review.id)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Update)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "EmployeeReview", review.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::models::{Customer, Department, Employee};
    use crate::repository::{CustomerRepository, DepartmentRepository, EmployeeRepository};
    use chrono::NaiveDate;

    struct Fixture {
        customers: Vec<i64>,
        employees: Vec<i64>,
    }

    async fn fixture(conn: &mut SqliteConnection) -> Fixture {
        let department = Department {
            id: 0,
            name: "Support".to_string(),
        };
        let dept = DepartmentRepository::create(conn, &[], department).await.unwrap().id;

        let mut customers = Vec::new();
        for first in ["Ann", "Bob"] {
            let customer = Customer {
                id: 0,
                first_name: first.to_string(),
                last_name: "Client".to_string(),
            };
            customers.push(CustomerRepository::create(conn, customer).await.unwrap().id);
        }

        let mut employees = Vec::new();
        for first in ["Eve", "Fay"] {
            let employee = Employee {
                id: 0,
                first_name: first.to_string(),
                last_name: "Agent".to_string(),
                hire_date: NaiveDate::from_ymd_opt(2022, 9, 1)
                    .and_then(|d| d.and_hms_opt(8, 0, 0))
                    .unwrap(),
                job_title: "Support Agent".to_string(),
                salary_per_month: 3000,
                department_id: dept,
            };
            employees.push(EmployeeRepository::create(conn, dept, employee).await.unwrap().id);
        }

        Fixture { customers, employees }
    }

    fn review(rating: i32, title: &str) -> EmployeeReview {
        EmployeeReview {
            id: 0,
            rating,
            title: title.to_string(),
            content: "Resolved the issue quickly and explained every step.".to_string(),
            employee_id: 0,
            customer_id: 0,
        }
    }

    #[tokio::test]
    async fn test_create_sets_references() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let fx = fixture(&mut conn).await;

        let created = EmployeeReviewRepository::create(&mut conn, fx.customers[0], fx.employees[1], review(4, "Very helpful"))
            .await
            .unwrap();
        assert_eq!(created.customer_id, fx.customers[0]);
        assert_eq!(created.employee_id, fx.employees[1]);
        assert_eq!(EmployeeReviewRepository::get_by_id(&mut conn, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_filters() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let fx = fixture(&mut conn).await;

        for (customer, employee, rating) in [(0, 0, 5), (0, 1, 2), (1, 0, 3), (1, 1, 0)] {
            EmployeeReviewRepository::create(
                &mut conn,
                fx.customers[customer],
                fx.employees[employee],
                review(rating, "Review title"),
            )
            .await
            .unwrap();
        }

        let by_rating = OrderBy::resolve::<EmployeeReview>("rating", false);

        let ratings = |reviews: Vec<EmployeeReview>| reviews.iter().map(|r| r.rating).collect::<Vec<_>>();

        let of_ann = EmployeeReviewRepository::get_by_customer(&mut conn, fx.customers[0], by_rating)
            .await
            .unwrap();
        assert_eq!(ratings(of_ann), vec![2, 5]);

        let for_eve = EmployeeReviewRepository::get_for_employee(&mut conn, fx.employees[0], by_rating)
            .await
            .unwrap();
        assert_eq!(ratings(for_eve), vec![3, 5]);

        let middle = EmployeeReviewRepository::get_by_rating_range(&mut conn, 2, 3, by_rating)
            .await
            .unwrap();
        assert_eq!(ratings(middle), vec![2, 3]);

        let exact = EmployeeReviewRepository::get_by_rating_range(&mut conn, 0, 0, by_rating)
            .await
            .unwrap();
        assert_eq!(ratings(exact), vec![0]);
    }

    #[tokio::test]
    async fn test_update_keeps_references() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let fx = fixture(&mut conn).await;
        let created = EmployeeReviewRepository::create(&mut conn, fx.customers[1], fx.employees[0], review(1, "Slow answer"))
            .await
            .unwrap();

        let changed = EmployeeReview {
            rating: 3,
            title: "Better on follow-up".to_string(),
            employee_id: fx.employees[1],
            customer_id: fx.customers[0],
            ..created.clone()
        };
        EmployeeReviewRepository::update(&mut conn, &changed).await.unwrap();

        let stored = EmployeeReviewRepository::get_by_id(&mut conn, created.id).await.unwrap();
        assert_eq!(stored.rating, 3);
        assert_eq!(stored.title, "Better on follow-up");
        assert_eq!(stored.employee_id, fx.employees[0]);
        assert_eq!(stored.customer_id, fx.customers[1]);
    }

    #[tokio::test]
    async fn test_reviews_die_with_employee() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let fx = fixture(&mut conn).await;
        EmployeeReviewRepository::create(&mut conn, fx.customers[0], fx.employees[0], review(5, "Excellent help"))
            .await
            .unwrap();

        EmployeeRepository::delete(&mut conn, fx.employees[0]).await.unwrap();

        let left = EmployeeReviewRepository::get_all(&mut conn, OrderBy::default()).await.unwrap();
        assert!(left.is_empty());
    }
}
