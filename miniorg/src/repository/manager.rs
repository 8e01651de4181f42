use sqlx::{Connection, SqliteConnection};

use super::{
    distinct, ensure_affected, ManagerRepository, RepositoryError, RepositoryOperation, RepositoryResult,
    SqlxResultExt,
};
use crate::models::{Department, Manager};
use crate::ordering::OrderBy;

impl ManagerRepository {
    /// Departments this manager has an edge to
    pub async fn departments_of(
        conn: &mut SqliteConnection,
        id: i64,
        order: OrderBy,
    ) -> RepositoryResult<Vec<Department>> {
        let sql = format!(
            "SELECT * FROM departments \
             WHERE id IN (SELECT department_id FROM department_managers WHERE manager_id = ?) {}",
            order.to_sql()
        );
        sqlx::query_as::<_, Department>(&sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .during(RepositoryOperation::FindAll)
    }

    /// Insert the manager and one edge per distinct department id, atomically
    pub async fn create(
        conn: &mut SqliteConnection,
        department_ids: &[i64],
        manager: Manager,
    ) -> RepositoryResult<Manager> {
        let mut tx = conn.begin().await.during(RepositoryOperation::Transaction)?;

        let id = sqlx::query("INSERT INTO managers (first_name, last_name) VALUES (?, ?)")
            .bind(&manager.first_name)
            .bind(&manager.last_name)
            .execute(&mut *tx)
            .await
            .during(RepositoryOperation::Create)?
            .last_insert_rowid();

        for department_id in distinct(department_ids) {
            sqlx::query("INSERT INTO department_managers (department_id, manager_id) VALUES (?, ?)")
                .bind(department_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    RepositoryError::from_sqlx(RepositoryOperation::Create, e)
                        .with_entity("Department", department_id)
                })?;
        }

        tx.commit().await.during(RepositoryOperation::Transaction)?;

        Ok(Manager { id, ..manager })
    }

    pub async fn update(conn: &mut SqliteConnection, manager: &Manager) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE managers SET first_name = ?, last_name = ? WHERE id = ?")
            .bind(&manager.first_name)
            .bind(&manager.last_name)
            .bind(manager.id)
            .execute(&mut *conn)
            .await
            .during(RepositoryOperation::Update)?;

        ensure_affected(result.rows_affected(), RepositoryOperation::Update, "Manager", manager.id)
    }
}
