//! Extractors that reject with [`ApiError`]
//!
//! axum's own rejections answer in plain text with a mix of 400 and 422.
//! These wrappers turn every malformed path, query or body into a 400
//! [`ApiError`] with the same JSON shape as the rest of the API.

use axum::extract::{FromRequest, FromRequestParts};

use super::ApiError;

/// JSON body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
