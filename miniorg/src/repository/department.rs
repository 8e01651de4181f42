use sqlx::{Connection, SqliteConnection};

use super::{
    distinct, ensure_affected, DepartmentRepository, RepositoryError, RepositoryOperation,
    RepositoryResult, SqlxResultExt,
};
use crate::models::{Department, DepartmentManager, Employee, Manager};
use crate::ordering::OrderBy;

impl DepartmentRepository {
    /// Managers with an edge to this department
    pub async fn managers_of(
        conn: &mut SqliteConnection,
        id: i64,
        order: OrderBy,
    ) -> RepositoryResult<Vec<Manager>> {
        let sql = format!(
            "SELECT * FROM managers \
             WHERE id IN (SELECT manager_id FROM department_managers WHERE department_id = ?) {}",
            order.to_sql()
        );
        sqlx::query_as::<_, Manager>(&sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    pub async fn employees_of(
        conn: &mut SqliteConnection,
        id: i64,
        order: OrderBy,
    ) -> RepositoryResult<Vec<Employee>> {
        let sql = format!("SELECT * FROM employees WHERE department_id = ? {}", order.to_sql());
        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// Edge rows of this department, by manager id
    pub async fn edges_of(conn: &mut SqliteConnection, id: i64) -> RepositoryResult<Vec<DepartmentManager>> {
        sqlx::query_as::<_, DepartmentManager>(
            "SELECT department_id, manager_id FROM department_managers \
             WHERE department_id = ? ORDER BY manager_id ASC",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await
        .during(RepositoryOperation::FindAll)
    }

    pub async fn is_managed_by(conn: &mut SqliteConnection, id: i64, manager_id: i64) -> RepositoryResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM department_managers WHERE department_id = ? AND manager_id = ?",
        )
        .bind(id)
        .bind(manager_id)
        .fetch_one(&mut *conn)
        .await
        .during(RepositoryOperation::Exists)?;
        Ok(count > 0)
    }

    /// Insert the department and one edge per distinct manager id
    ///
    /// Runs in a single transaction: a manager id without a row fails the
    /// foreign key and nothing is kept.
    pub async fn create(
        conn: &mut SqliteConnection,
        manager_ids: &[i64],
        department: Department,
    ) -> RepositoryResult<Department> {
        let mut tx = conn.begin().await.during(RepositoryOperation::Transaction)?;

        let id = sqlx::query("INSERT INTO departments (name) VALUES (?)")
            .bind(&department.name)
            .execute(&mut *tx)
            .await
            .during(RepositoryOperation::Create)?
            .last_insert_rowid();

        for manager_id in distinct(manager_ids) {
            sqlx::query("INSERT INTO department_managers (department_id, manager_id) VALUES (?, ?)")
                .bind(id)
                .bind(manager_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx(RepositoryOperation::Create, e).with_entity("Manager", manager_id)
                })?;
        }

        tx.commit().await.during(RepositoryOperation::Transaction)?;

        Ok(Department { id, ..department })
    }

    /// Delete exactly one edge
    pub async fn remove_manager(conn: &mut SqliteConnection, id: i64, manager_id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM department_managers WHERE department_id = ? AND manager_id = ?")
            .bind(id)
            .bind(manager_id)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Delete)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Delete, "DepartmentManager", id)
    }

    pub async fn update(conn: &mut SqliteConnection, department: &Department) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE departments SET name = ? WHERE id = ?")
            .bind(&department.name)
            .bind(department.id)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Update)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "Department", department.id)
    }
}
