use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{
    connection, ensure_exists, validated, ApiError, ApiJson, ApiOperation, ApiPath, ApiQuery, ListQuery,
    OrPersistence,
};
use crate::dto::EmployeeReviewDto;
use crate::models::{Customer, Employee, EmployeeReview};
use crate::pagination::Page;
use crate::repository::EmployeeReviewRepository;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(get_all))
        .route("/GetByRatingRange", get(get_by_rating_range))
        .route("/Create", post(create))
        .route("/ByCustomer/{id}", get(by_customer))
        .route("/ForEmployee/{id}", get(for_employee))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

/// Inclusive rating bounds; each must fit in a byte
#[derive(Debug, Deserialize)]
pub struct RatingRangeQuery {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTargetQuery {
    pub customer_id: i64,
    pub employee_id: i64,
}

async fn get_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeReviewDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let reviews = EmployeeReviewRepository::get_all(&mut conn, query.order::<EmployeeReview>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(reviews).map(EmployeeReviewDto::from))
}

async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<EmployeeReviewDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<EmployeeReview>(&mut conn, id, ApiOperation::Get).await?;

    let review = EmployeeReviewRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(review.into()))
}

async fn by_customer(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeReviewDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    ensure_exists::<Customer>(&mut conn, customer_id, ApiOperation::List).await?;

    let reviews = EmployeeReviewRepository::get_by_customer(&mut conn, customer_id, query.order::<EmployeeReview>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(reviews).map(EmployeeReviewDto::from))
}

async fn for_employee(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeReviewDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    ensure_exists::<Employee>(&mut conn, employee_id, ApiOperation::List).await?;

    let reviews = EmployeeReviewRepository::get_for_employee(&mut conn, employee_id, query.order::<EmployeeReview>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(reviews).map(EmployeeReviewDto::from))
}

async fn get_by_rating_range(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<RatingRangeQuery>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<EmployeeReviewDto>, ApiError> {
    query.validate()?;
    if range.min > range.max {
        return Err(ApiError::bad_request(format!(
            "min ({}) must not be greater than max ({})",
            range.min, range.max
        ))
        .with_operation(ApiOperation::List));
    }

    let mut conn = connection(&state, ApiOperation::List).await?;
    let reviews = EmployeeReviewRepository::get_by_rating_range(
        &mut conn,
        i32::from(range.min),
        i32::from(range.max),
        query.order::<EmployeeReview>(),
    )
    .await
    .or_persistence(ApiOperation::List)?;

    Ok(query.page(reviews).map(EmployeeReviewDto::from))
}

/// `POST /Create?customerId=1&employeeId=2`
async fn create(
    State(state): State<AppState>,
    ApiQuery(target): ApiQuery<ReviewTargetQuery>,
    ApiJson(body): ApiJson<EmployeeReviewDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Create)?;

    let mut conn = connection(&state, ApiOperation::Create).await?;
    ensure_exists::<Customer>(&mut conn, target.customer_id, ApiOperation::Create).await?;
    ensure_exists::<Employee>(&mut conn, target.employee_id, ApiOperation::Create).await?;

    let created = EmployeeReviewRepository::create(
        &mut conn,
        target.customer_id,
        target.employee_id,
        body.into_entity(target.employee_id, target.customer_id),
    )
    .await
    .or_persistence(ApiOperation::Create)?;

    tracing::debug!(
        review_id = created.id,
        customer_id = target.customer_id,
        employee_id = target.employee_id,
        "Review created"
    );
    Ok(StatusCode::CREATED)
}

/// Replace rating, title and content; author and subject stay as stored
async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<EmployeeReviewDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Update)?;
    if body.id != id {
        return Err(ApiError::id_mismatch(id, body.id));
    }

    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<EmployeeReview>(&mut conn, id, ApiOperation::Update).await?;

    let current = EmployeeReviewRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Update)?;
    EmployeeReviewRepository::update(&mut conn, &body.into_entity(current.employee_id, current.customer_id))
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(review_id = id, "Review updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Delete).await?;
    ensure_exists::<EmployeeReview>(&mut conn, id, ApiOperation::Delete).await?;

    EmployeeReviewRepository::delete(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;

    tracing::debug!(review_id = id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}
