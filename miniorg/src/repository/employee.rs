use sqlx::SqliteConnection;

use super::{ensure_affected, EmployeeRepository, RepositoryError, RepositoryOperation, RepositoryResult, SqlxResultExt};
use crate::models::{Department, Employee};
use crate::ordering::OrderBy;

impl EmployeeRepository {
    /// Exact, case-sensitive match on the job title
    pub async fn get_by_job_title(
        conn: &mut SqliteConnection,
        job_title: &str,
        order: OrderBy,
    ) -> RepositoryResult<Vec<Employee>> {
        let sql = format!("SELECT * FROM employees WHERE job_title = ? {}", order.to_sql());
        sqlx::query_as::<_, Employee>(&sql)
            .bind(job_title)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// The department an employee belongs to
    pub async fn department_of(conn: &mut SqliteConnection, id: i64) -> RepositoryResult<Department> {
        sqlx::query_as::<_, Department>(
            "SELECT * FROM departments WHERE id = (SELECT department_id FROM employees WHERE id = ?)",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .during(RepositoryOperation::FindById)?
        .ok_or_else(|| RepositoryError::not_found("Employee", id))
    }

    /// Insert into `department_id`; the id and department of `employee` are ignored
    pub async fn create(
        conn: &mut SqliteConnection,
        department_id: i64,
        employee: Employee,
    ) -> RepositoryResult<Employee> {
        let result = sqlx::query(
            "INSERT INTO employees \
             (first_name, last_name, hire_date, job_title, salary_per_month, department_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(employee.hire_date)
        .bind(&employee.job_title)
        .bind(employee.salary_per_month)
        .bind(department_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx(RepositoryOperation::Create, e).with_entity("Department", department_id))?;

        Ok(Employee {
            id: result.last_insert_rowid(),
            department_id,
            ..employee
        })
    }

    /// Replace the scalar fields; the department is left as stored
    pub async fn update(conn: &mut SqliteConnection, employee: &Employee) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE employees \
             SET first_name = ?, last_name = ?, hire_date = ?, job_title = ?, salary_per_month = ? \
             WHERE id = ?",
        )
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(employee.hire_date)
        .bind(&employee.job_title)
        .bind(employee.salary_per_month)
        .bind(employee.id)
        .execute(&mut *conn)
        .await
        .during(RepositoryOperation::Update)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "Employee", employee.id)
    }

    pub async fn change_department(conn: &mut SqliteConnection, id: i64, department_id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE employees SET department_id = ? WHERE id = ?")
            .bind(department_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                RepositoryError::from_sqlx(RepositoryOperation::Update, e).with_entity("Department", department_id)
            })?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "Employee", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::repository::{DepartmentRepository, RepositoryErrorKind};
    use chrono::NaiveDate;

    fn employee(first: &str, title: &str, salary: i32) -> Employee {
        Employee {
            id: 0,
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            hire_date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .unwrap(),
            job_title: title.to_string(),
            salary_per_month: salary,
            department_id: 0,
        }
    }

    async fn department(conn: &mut SqliteConnection, name: &str) -> i64 {
        let department = Department {
            id: 0,
            name: name.to_string(),
        };
        DepartmentRepository::create(conn, &[], department).await.unwrap().id
    }

    #[tokio::test]
    async fn test_create_round_trips_hire_date() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let dept = department(&mut conn, "Ops").await;

        let created = EmployeeRepository::create(&mut conn, dept, employee("Ada", "Engineer", 5000))
            .await
            .unwrap();
        assert_eq!(created.department_id, dept);

        let stored = EmployeeRepository::get_by_id(&mut conn, created.id).await.unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_create_in_missing_department_fails() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let err = EmployeeRepository::create(&mut conn, 8, employee("Ada", "Engineer", 5000))
            .await
            .unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Create);
        assert!(EmployeeRepository::get_all(&mut conn, OrderBy::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_job_title_is_exact_and_ordered() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let dept = department(&mut conn, "Ops").await;

        for (name, title, salary) in [
            ("Ada", "Engineer", 5000),
            ("Bea", "engineer", 7000),
            ("Cal", "Engineer", 9000),
            ("Dan", "Designer", 4000),
        ] {
            EmployeeRepository::create(&mut conn, dept, employee(name, title, salary)).await.unwrap();
        }

        let engineers = EmployeeRepository::get_by_job_title(
            &mut conn,
            "Engineer",
            OrderBy::resolve::<Employee>("salaryPerMonth", true),
        )
        .await
        .unwrap();
        let names: Vec<&str> = engineers.iter().map(|e| e.first_name.as_str()).collect();
        assert_eq!(names, vec!["Cal", "Ada"]);
    }

    #[tokio::test]
    async fn test_department_of_and_change_department() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let ops = department(&mut conn, "Ops").await;
        let sales = department(&mut conn, "Sales").await;
        let created = EmployeeRepository::create(&mut conn, ops, employee("Ada", "Engineer", 5000))
            .await
            .unwrap();

        assert_eq!(EmployeeRepository::department_of(&mut conn, created.id).await.unwrap().name, "Ops");

        EmployeeRepository::change_department(&mut conn, created.id, sales).await.unwrap();
        assert_eq!(EmployeeRepository::department_of(&mut conn, created.id).await.unwrap().name, "Sales");

        let err = EmployeeRepository::department_of(&mut conn, 500).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_keeps_department() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let ops = department(&mut conn, "Ops").await;
        let created = EmployeeRepository::create(&mut conn, ops, employee("Ada", "Engineer", 5000))
            .await
            .unwrap();

        let changed = Employee {
            job_title: "Staff Engineer".to_string(),
            salary_per_month: 6500,
            department_id: 999,
            ..created.clone()
        };
        EmployeeRepository::update(&mut conn, &changed).await.unwrap();

        let stored = EmployeeRepository::get_by_id(&mut conn, created.id).await.unwrap();
        assert_eq!(stored.job_title, "Staff Engineer");
        assert_eq!(stored.salary_per_month, 6500);
        assert_eq!(stored.department_id, ops);
    }

    #[tokio::test]
    async fn test_department_with_employees_cannot_be_deleted() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let ops = department(&mut conn, "Ops").await;
        EmployeeRepository::create(&mut conn, ops, employee("Ada", "Engineer", 5000))
            .await
            .unwrap();

        let err = DepartmentRepository::delete(&mut conn, ops).await.unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Delete);
        assert!(DepartmentRepository::exists(&mut conn, ops).await.unwrap());
    }
}
