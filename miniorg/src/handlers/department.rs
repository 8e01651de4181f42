use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use super::{
    connection, ensure_exists, linked_ids, validated, ApiError, ApiErrorKind, ApiJson, ApiOperation, ApiPath, ApiQuery, ListQuery,
    OrPersistence,
};
use crate::dto::{DepartmentDto, EmployeeDto, ManagerDto};
use crate::models::{Department, Employee, Manager};
use crate::ordering::OrderBy;
use crate::pagination::Page;
use crate::repository::{DepartmentRepository, ManagerRepository};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(get_all))
        .route("/Create", post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/Managers", get(managers))
        .route("/{id}/Employees", get(employees))
        .route("/{id}/RemoveManager/{manager_id}", patch(remove_manager))
}

async fn get_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<DepartmentDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let departments = DepartmentRepository::get_all(&mut conn, query.order::<Department>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(departments).map(DepartmentDto::from))
}

async fn get_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<DepartmentDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::Get).await?;

    let department = DepartmentRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(department.into()))
}

async fn managers(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<ManagerDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::List).await?;

    let managers = DepartmentRepository::managers_of(&mut conn, id, query.order::<Manager>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(managers).map(ManagerDto::from))
}

async fn employees(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::List).await?;

    let employees = DepartmentRepository::employees_of(&mut conn, id, query.order::<Employee>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(employees).map(EmployeeDto::from))
}

/// `POST /Create?managerIds=1&managerIds=2`
///
/// The manager gate only requires one of the ids to exist; an unknown id
/// among them fails the insert and nothing is created.
async fn create(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    ApiJson(body): ApiJson<DepartmentDto>,
) -> Result<StatusCode, ApiError> {
    let manager_ids = linked_ids(raw.as_deref(), "managerIds").map_err(|e| e.with_operation(ApiOperation::Create))?;
    let body = validated(body, ApiOperation::Create)?;

    let mut conn = connection(&state, ApiOperation::Create).await?;
    if !ManagerRepository::exists_any(&mut conn, &manager_ids)
        .await
        .or_persistence(ApiOperation::Create)?
    {
        tracing::warn!(?manager_ids, "None of the managers exist");
        return Err(ApiError::new(ApiOperation::Create, ApiErrorKind::NotFound, "Managers not found")
            .with_entity("Manager", format!("{:?}", manager_ids)));
    }

    let created = DepartmentRepository::create(&mut conn, &manager_ids, body.into())
        .await
        .or_persistence(ApiOperation::Create)?;

    tracing::debug!(department_id = created.id, managers = manager_ids.len(), "Department created");
    Ok(StatusCode::CREATED)
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<DepartmentDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Update)?;
    if body.id != id {
        return Err(ApiError::id_mismatch(id, body.id));
    }

    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::Update).await?;

    DepartmentRepository::update(&mut conn, &body.into())
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(department_id = id, "Department updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Remove one manager edge; 304 when the edge is already absent
async fn remove_manager(
    State(state): State<AppState>,
    ApiPath((id, manager_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::Update).await?;
    ensure_exists::<Manager>(&mut conn, manager_id, ApiOperation::Update).await?;

    if !DepartmentRepository::is_managed_by(&mut conn, id, manager_id)
        .await
        .or_persistence(ApiOperation::Update)?
    {
        tracing::debug!(department_id = id, manager_id, "Manager edge already absent");
        return Err(ApiError::not_modified(ApiOperation::Update));
    }

    DepartmentRepository::remove_manager(&mut conn, id, manager_id)
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(department_id = id, manager_id, "Manager removed from department");
    Ok(StatusCode::NO_CONTENT)
}

/// Only a department with no managers and no employees can be deleted
async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Delete).await?;
    ensure_exists::<Department>(&mut conn, id, ApiOperation::Delete).await?;

    let edges = DepartmentRepository::edges_of(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;
    if !edges.is_empty() {
        tracing::warn!(department_id = id, managers = edges.len(), "Delete blocked by managers");
        return Err(ApiError::conflict(
            ApiOperation::Delete,
            "Cannot delete a department that still has managers.",
        ));
    }

    let employees = DepartmentRepository::employees_of(&mut conn, id, OrderBy::default())
        .await
        .or_persistence(ApiOperation::Delete)?;
    if !employees.is_empty() {
        tracing::warn!(department_id = id, employees = employees.len(), "Delete blocked by employees");
        return Err(ApiError::conflict(
            ApiOperation::Delete,
            "Cannot delete a department that still has employees.",
        ));
    }

    DepartmentRepository::delete(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;

    tracing::debug!(department_id = id, "Department deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    /// Three managers, no departments
    async fn with_managers() -> TestApp {
        let app = TestApp::new().await;
        for first in ["Grace", "Alan", "Edsger"] {
            sqlx::query("INSERT INTO managers (first_name, last_name) VALUES (?, 'Smith')")
                .bind(first)
                .execute(app.state.db())
                .await
                .unwrap();
        }
        app
    }

    async fn edges(app: &TestApp) -> Vec<(i64, i64)> {
        sqlx::query_as("SELECT department_id, manager_id FROM department_managers ORDER BY department_id, manager_id")
            .fetch_all(app.state.db())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_with_three_managers() {
        let app = with_managers().await;

        let status = app
            .post(
                "/api/Department/Create?managerIds=1&managerIds=2&managerIds=3",
                json!({ "name": "Research" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(edges(&app).await, vec![(1, 1), (1, 2), (1, 3)]);

        let (status, body) = app.get("/api/Department/1/Managers?orderBy=firstName").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["firstName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alan", "Edsger", "Grace"]);
    }

    #[tokio::test]
    async fn test_create_gates() {
        let app = with_managers().await;
        let body = json!({ "name": "Research" });

        assert_eq!(app.post("/api/Department/Create", body.clone()).await, StatusCode::BAD_REQUEST);

        let eleven: Vec<String> = (1..=11).map(|id| format!("managerIds={id}")).collect();
        let uri = format!("/api/Department/Create?{}", eleven.join("&"));
        assert_eq!(app.post(&uri, body.clone()).await, StatusCode::BAD_REQUEST);

        assert_eq!(
            app.post("/api/Department/Create?managerIds=40&managerIds=41", body.clone()).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            app.post("/api/Department/Create?managerIds=x", body.clone()).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            app.post("/api/Department/Create?managerIds=1", json!({ "name": "" })).await,
            StatusCode::BAD_REQUEST
        );

        assert_eq!(app.count("SELECT COUNT(*) FROM departments").await, 0);
    }

    #[tokio::test]
    async fn test_create_with_one_unknown_manager_is_atomic() {
        let app = with_managers().await;

        let status = app
            .post("/api/Department/Create?managerIds=1&managerIds=77", json!({ "name": "Research" }))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.count("SELECT COUNT(*) FROM departments").await, 0);
        assert!(edges(&app).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_manager() {
        let app = with_managers().await;
        app.post("/api/Department/Create?managerIds=1&managerIds=2", json!({ "name": "Ops" }))
            .await;

        assert_eq!(app.patch("/api/Department/1/RemoveManager/3").await, StatusCode::NOT_MODIFIED);
        assert_eq!(edges(&app).await, vec![(1, 1), (1, 2)]);

        assert_eq!(app.patch("/api/Department/1/RemoveManager/2").await, StatusCode::NO_CONTENT);
        assert_eq!(edges(&app).await, vec![(1, 1)]);

        assert_eq!(app.patch("/api/Department/1/RemoveManager/9").await, StatusCode::NOT_FOUND);
        assert_eq!(app.patch("/api/Department/5/RemoveManager/1").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let app = with_managers().await;
        app.post("/api/Department/Create?managerIds=1", json!({ "name": "Ops" })).await;

        assert_eq!(app.delete("/api/Department/1").await, StatusCode::BAD_REQUEST);
        let (_, bytes) = app.request(axum::http::Method::DELETE, "/api/Department/1", None).await;
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Cannot delete a department that still has managers.");

        app.patch("/api/Department/1/RemoveManager/1").await;
        app.post(
            "/api/Employee/Create?departmentId=1",
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "hireDate": "2024-01-15T09:00:00",
                "jobTitle": "Engineer",
                "salaryPerMonth": 5000
            }),
        )
        .await;

        let (_, bytes) = app.request(axum::http::Method::DELETE, "/api/Department/1", None).await;
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Cannot delete a department that still has employees.");
        assert_eq!(app.count("SELECT COUNT(*) FROM departments").await, 1);

        app.delete("/api/Employee/1").await;
        assert_eq!(app.delete("/api/Department/1").await, StatusCode::NO_CONTENT);
        assert_eq!(app.delete("/api/Department/1").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let app = with_managers().await;
        app.post("/api/Department/Create?managerIds=1", json!({ "name": "Ops" })).await;
        app.post("/api/Department/Create?managerIds=2", json!({ "name": "Billing" })).await;

        assert_eq!(
            app.put("/api/Department/1", json!({ "id": 1, "name": "Operations" })).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            app.put("/api/Department/1", json!({ "id": 3, "name": "Operations" })).await,
            StatusCode::BAD_REQUEST
        );

        let (status, body) = app.get("/api/Department/GetAll?orderBy=name").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "Billing");
        assert_eq!(body["data"][1]["name"], "Operations");

        assert_eq!(app.get("/api/Department/7/Employees").await.0, StatusCode::NOT_FOUND);
        let (status, body) = app.get("/api/Department/1/Employees").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }
}
