//! API error types for handler operations
//!
//! Every failure a handler can return, with its HTTP status. Client errors
//! carry a message meant for the caller; persistence failures carry only a
//! generic message naming the operation, and the underlying
//! [`RepositoryError`] is logged instead.
//!
//! # Example
//!
//! ```rust
//! use axum::http::StatusCode;
//! use miniorg::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("Department", 12);
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.kind.status_code(), StatusCode::NOT_FOUND);
//! assert_eq!(error.entity_id, Some("12".to_string()));
//! ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::repository::RepositoryError;

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing entities
    List,
    /// Getting a single entity
    Get,
    /// Creating an entity
    Create,
    /// Updating an entity or one of its relations
    Update,
    /// Deleting an entity
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl ApiOperation {
    /// Message returned to clients when storage fails during this operation
    #[must_use]
    pub const fn failure_message(&self) -> &'static str {
        match self {
            Self::List | Self::Get => "Something went wrong while loading.",
            Self::Create => "Something went wrong while saving.",
            Self::Update => "Something went wrong while updating.",
            Self::Delete => "Something went wrong while deleting.",
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// A referenced entity does not exist
    NotFound,
    /// Malformed path, query or body, or out-of-range paging
    BadRequest,
    /// Body fields failed their constraints
    ValidationFailed,
    /// Operation blocked by dependent rows
    Conflict,
    /// State already matches the request
    NotModified,
    /// Storage failed after preconditions passed
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::Conflict => write!(f, "conflict"),
            Self::NotModified => write!(f, "not_modified"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    ///
    /// Conflicts are reported as 400 with an explanatory message.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest | Self::ValidationFailed | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::NotModified => StatusCode::NOT_MODIFIED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Client-facing message
    pub message: String,
    /// The type of entity involved (e.g. "Manager")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// A referenced entity does not exist
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::NotFound, "Entity not found").with_entity(entity_type, entity_id)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::List, ApiErrorKind::BadRequest, message)
    }

    /// Path id and body id disagree
    pub fn id_mismatch(path_id: i64, body_id: i64) -> Self {
        Self::new(
            ApiOperation::Update,
            ApiErrorKind::BadRequest,
            format!("Body id {} does not match path id {}", body_id, path_id),
        )
    }

    /// Collect every field message, sorted so the output is stable
    pub fn validation(errors: &ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errors| errors.iter())
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code))
            })
            .collect();
        messages.sort();

        let message = if messages.is_empty() {
            "Validation failed".to_string()
        } else {
            messages.join(", ")
        };

        Self::new(ApiOperation::Create, ApiErrorKind::ValidationFailed, message)
    }

    pub fn conflict(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::Conflict, message)
    }

    /// The requested state already holds; answered with an empty 304
    pub fn not_modified(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::NotModified, "Not modified")
    }

    /// Storage failed; the client sees only a generic message
    pub fn persistence(operation: ApiOperation, err: RepositoryError) -> Self {
        tracing::error!(
            api_operation = %operation,
            repository_operation = %err.operation,
            kind = %err.kind,
            entity_type = ?err.entity_type,
            entity_id = ?err.entity_id,
            "Repository failure: {}", err.message
        );

        Self::new(operation, ApiErrorKind::InternalError, operation.failure_message())
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorResponse {
    error: String,
    code: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        }

        if self.kind == ApiErrorKind::NotModified {
            return status.into_response();
        }

        let response = ApiErrorResponse {
            error: self.message,
            code: self.kind.error_code(),
            status: status.as_u16(),
            operation: Some(self.operation.to_string()),
            entity_type: self.entity_type,
            entity_id: self.entity_id,
        };

        (status, Json(response)).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text()).with_operation(ApiOperation::Get)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text()).with_operation(ApiOperation::Create)
    }
}
