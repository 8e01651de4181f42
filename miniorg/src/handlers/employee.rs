use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::{
    connection, ensure_exists, validated, ApiError, ApiJson, ApiOperation, ApiPath, ApiQuery, ListQuery,
    OrPersistence,
};
use crate::dto::{DepartmentDto, EmployeeDto};
use crate::models::{Department, Employee};
use crate::pagination::Page;
use crate::repository::EmployeeRepository;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(get_all))
        .route("/GetByJobTitle", get(get_by_job_title))
        .route("/Create", post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/Department", get(department))
        .route("/{id}/ChangeDepartment/{department_id}", patch(change_department))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTitleQuery {
    pub job_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentQuery {
    pub department_id: i64,
}

async fn get_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let employees = EmployeeRepository::get_all(&mut conn, query.order::<Employee>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(employees).map(EmployeeDto::from))
}

async fn get_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<EmployeeDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<Employee>(&mut conn, id, ApiOperation::Get).await?;

    let employee = EmployeeRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(employee.into()))
}

/// Exact, case-sensitive job title match
async fn get_by_job_title(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<JobTitleQuery>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let employees = EmployeeRepository::get_by_job_title(&mut conn, &filter.job_title, query.order::<Employee>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(employees).map(EmployeeDto::from))
}

async fn department(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<DepartmentDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<Employee>(&mut conn, id, ApiOperation::Get).await?;

    let department = EmployeeRepository::department_of(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(department.into()))
}

/// `POST /Create?departmentId=3`
async fn create(
    State(state): State<AppState>,
    ApiQuery(target): ApiQuery<DepartmentQuery>,
    ApiJson(body): ApiJson<EmployeeDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Create)?;

    let mut conn = connection(&state, ApiOperation::Create).await?;
    ensure_exists::<Department>(&mut conn, target.department_id, ApiOperation::Create).await?;

    let created = EmployeeRepository::create(&mut conn, target.department_id, body.into_entity(target.department_id))
        .await
        .or_persistence(ApiOperation::Create)?;

    tracing::debug!(employee_id = created.id, department_id = target.department_id, "Employee created");
    Ok(StatusCode::CREATED)
}

/// Replace the scalar fields; the department is only changed through
/// `ChangeDepartment`
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<EmployeeDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Update)?;
    if body.id != id {
        return Err(ApiError::id_mismatch(id, body.id));
    }

    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Employee>(&mut conn, id, ApiOperation::Update).await?;

    let current = EmployeeRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Update)?;
    EmployeeRepository::update(&mut conn, &body.into_entity(current.department_id))
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(employee_id = id, "Employee updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn change_department(
    State(state): State<AppState>,
    ApiPath((id, department_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Employee>(&mut conn, id, ApiOperation::Update).await?;
    ensure_exists::<Department>(&mut conn, department_id, ApiOperation::Update).await?;

    let current = EmployeeRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Update)?;
    if current.department_id == department_id {
        tracing::debug!(employee_id = id, department_id, "Employee already in department");
        return Err(ApiError::not_modified(ApiOperation::Update));
    }

    EmployeeRepository::change_department(&mut conn, id, department_id)
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(
        employee_id = id,
        from = current.department_id,
        to = department_id,
        "Employee moved to another department"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Delete).await?;
    ensure_exists::<Employee>(&mut conn, id, ApiOperation::Delete).await?;

    EmployeeRepository::delete(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;

    tracing::debug!(employee_id = id, "Employee deleted");
    Ok(StatusCode::NO_CONTENT)
}
