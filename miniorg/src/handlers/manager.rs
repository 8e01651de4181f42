use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::{
    connection, ensure_exists, linked_ids, validated, ApiError, ApiErrorKind, ApiJson, ApiOperation, ApiPath,
    ApiQuery, ListQuery, OrPersistence,
};
use crate::dto::{DepartmentDto, ManagerDto};
use crate::models::{Department, Manager};
use crate::ordering::OrderBy;
use crate::pagination::Page;
use crate::repository::{DepartmentRepository, ManagerRepository};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(get_all))
        .route("/Create", post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
        .route("/{id}/GetDepartments", get(departments))
}

async fn get_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<ManagerDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let managers = ManagerRepository::get_all(&mut conn, query.order::<Manager>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(managers).map(ManagerDto::from))
}

async fn get_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<ManagerDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<Manager>(&mut conn, id, ApiOperation::Get).await?;

    let manager = ManagerRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(manager.into()))
}

async fn departments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<DepartmentDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    ensure_exists::<Manager>(&mut conn, id, ApiOperation::List).await?;

    let departments = ManagerRepository::departments_of(&mut conn, id, query.order::<Department>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(departments).map(DepartmentDto::from))
}

/// `POST /Create?departmentIds=1&departmentIds=2`
async fn create(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    ApiJson(body): ApiJson<ManagerDto>,
) -> Result<StatusCode, ApiError> {
    let department_ids =
        linked_ids(raw.as_deref(), "departmentIds").map_err(|e| e.with_operation(ApiOperation::Create))?;
    let body = validated(body, ApiOperation::Create)?;

    let mut conn = connection(&state, ApiOperation::Create).await?;
    if !DepartmentRepository::exists_any(&mut conn, &department_ids)
        .await
        .or_persistence(ApiOperation::Create)?
    {
        tracing::warn!(?department_ids, "None of the departments exist");
        return Err(ApiError::new(ApiOperation::Create, ApiErrorKind::NotFound, "Departments not found")
            .with_entity("Department", format!("{:?}", department_ids)));
    }

    let created = ManagerRepository::create(&mut conn, &department_ids, body.into())
        .await
        .or_persistence(ApiOperation::Create)?;

    tracing::debug!(manager_id = created.id, departments = department_ids.len(), "Manager created");
    Ok(StatusCode::CREATED)
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ManagerDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Update)?;
    if body.id != id {
        return Err(ApiError::id_mismatch(id, body.id));
    }

    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Manager>(&mut conn, id, ApiOperation::Update).await?;

    ManagerRepository::update(&mut conn, &body.into())
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(manager_id = id, "Manager updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Delete).await?;
    ensure_exists::<Manager>(&mut conn, id, ApiOperation::Delete).await?;

    let managed = ManagerRepository::departments_of(&mut conn, id, OrderBy::default())
        .await
        .or_persistence(ApiOperation::Delete)?;
    if !managed.is_empty() {
        tracing::warn!(manager_id = id, departments = managed.len(), "Delete blocked by managed departments");
        return Err(ApiError::conflict(
            ApiOperation::Delete,
            "Cannot delete a manager who still manages departments.",
        ));
    }

    ManagerRepository::delete(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;

    tracing::debug!(manager_id = id, "Manager deleted");
    Ok(StatusCode::NO_CONTENT)
}
