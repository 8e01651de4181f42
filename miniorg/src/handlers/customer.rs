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
use crate::dto::CustomerDto;
use crate::models::Customer;
use crate::pagination::Page;
use crate::repository::CustomerRepository;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/GetAll", get(get_all))
        .route("/GetByFullName", get(get_by_full_name))
        .route("/Create", post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullNameQuery {
    pub first_name: String,
    pub last_name: String,
}

async fn get_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Page<CustomerDto>, ApiError> {
    query.validate()?;

    let mut conn = connection(&state, ApiOperation::List).await?;
    let customers = CustomerRepository::get_all(&mut conn, query.order::<Customer>())
        .await
        .or_persistence(ApiOperation::List)?;

    Ok(query.page(customers).map(CustomerDto::from))
}

async fn get_by_id(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<Json<CustomerDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    ensure_exists::<Customer>(&mut conn, id, ApiOperation::Get).await?;

    let customer = CustomerRepository::get_by_id(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Get)?;

    Ok(Json(customer.into()))
}

async fn get_by_full_name(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FullNameQuery>,
) -> Result<Json<CustomerDto>, ApiError> {
    let mut conn = connection(&state, ApiOperation::Get).await?;
    let customer = CustomerRepository::get_by_full_name(&mut conn, &query.first_name, &query.last_name)
        .await
        .or_persistence(ApiOperation::Get)?
        .ok_or_else(|| {
            tracing::warn!(first_name = %query.first_name, last_name = %query.last_name, "No customer with that name");
            ApiError::not_found("Customer", format!("{} {}", query.first_name, query.last_name))
        })?;

    Ok(Json(customer.into()))
}

async fn create(State(state): State<AppState>, ApiJson(body): ApiJson<CustomerDto>) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Create)?;

    let mut conn = connection(&state, ApiOperation::Create).await?;
    let created = CustomerRepository::create(&mut conn, body.into())
        .await
        .or_persistence(ApiOperation::Create)?;

    tracing::debug!(customer_id = created.id, "Customer created");
    Ok(StatusCode::CREATED)
}

async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CustomerDto>,
) -> Result<StatusCode, ApiError> {
    let body = validated(body, ApiOperation::Update)?;
    if body.id != id {
        return Err(ApiError::id_mismatch(id, body.id));
    }

    let mut conn = connection(&state, ApiOperation::Update).await?;
    ensure_exists::<Customer>(&mut conn, id, ApiOperation::Update).await?;

    CustomerRepository::update(&mut conn, &body.into())
        .await
        .or_persistence(ApiOperation::Update)?;

    tracing::debug!(customer_id = id, "Customer updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode, ApiError> {
    let mut conn = connection(&state, ApiOperation::Delete).await?;
    ensure_exists::<Customer>(&mut conn, id, ApiOperation::Delete).await?;

    CustomerRepository::delete(&mut conn, id)
        .await
        .or_persistence(ApiOperation::Delete)?;

    tracing::debug!(customer_id = id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn seeded() -> TestApp {
        let app = TestApp::new().await;
        for (first, last) in [("Ann", "Clark"), ("Bob", "Adams")] {
            let status = app
                .post("/api/Customer/Create", json!({ "firstName": first, "lastName": last }))
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        app
    }

    #[tokio::test]
    async fn test_get_all_orders_and_pages() {
        let app = seeded().await;

        let (status, body) = app
            .get("/api/Customer/GetAll?orderBy=lastName&decsending=true&pageNumber=1&pageSize=2")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageNumber"], 1);
        assert_eq!(body["hasPreviousPage"], false);
        assert_eq!(body["hasNextPage"], false);
        assert_eq!(body["data"][0]["lastName"], "Clark");
        assert_eq!(body["data"][1]["lastName"], "Adams");
    }

    #[tokio::test]
    async fn test_descending_flag_accepts_capitalized_true() {
        let app = seeded().await;

        let (status, body) = app.get("/api/Customer/GetAll?orderBy=lastName&decsending=True").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["lastName"], "Clark");
    }

    #[tokio::test]
    async fn test_get_all_rejects_bad_paging() {
        let app = seeded().await;
        assert_eq!(app.get("/api/Customer/GetAll?pageSize=31").await.0, StatusCode::BAD_REQUEST);
        assert_eq!(app.get("/api/Customer/GetAll?pageNumber=0").await.0, StatusCode::BAD_REQUEST);
        assert_eq!(app.get("/api/Customer/GetAll?pageSize=abc").await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let app = seeded().await;

        let (status, body) = app.get("/api/Customer/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 2, "firstName": "Bob", "lastName": "Adams" }));

        assert_eq!(app.get("/api/Customer/99").await.0, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/api/Customer/abc").await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_by_full_name() {
        let app = seeded().await;

        let (status, body) = app.get("/api/Customer/GetByFullName?firstName=Ann&lastName=Clark").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, _) = app.get("/api/Customer/GetByFullName?firstName=Ann&lastName=Adams").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.get("/api/Customer/GetByFullName?firstName=Ann").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_validates_names() {
        let app = TestApp::new().await;
        let status = app
            .post("/api/Customer/Create", json!({ "firstName": "Al", "lastName": "Clark" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.count("SELECT COUNT(*) FROM customers").await, 0);
    }

    #[tokio::test]
    async fn test_update() {
        let app = seeded().await;

        let status = app
            .put("/api/Customer/1", json!({ "id": 1, "firstName": "Anne", "lastName": "Clarke" }))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(app.get("/api/Customer/1").await.1["lastName"], "Clarke");

        let mismatch = app
            .put("/api/Customer/1", json!({ "id": 2, "firstName": "Anne", "lastName": "Clarke" }))
            .await;
        assert_eq!(mismatch, StatusCode::BAD_REQUEST);

        let missing = app
            .put("/api/Customer/9", json!({ "id": 9, "firstName": "Anne", "lastName": "Clarke" }))
            .await;
        assert_eq!(missing, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete() {
        let app = seeded().await;
        assert_eq!(app.delete("/api/Customer/1").await, StatusCode::NO_CONTENT);
        assert_eq!(app.delete("/api/Customer/1").await, StatusCode::NOT_FOUND);
        assert_eq!(app.count("SELECT COUNT(*) FROM customers").await, 1);
    }
}
