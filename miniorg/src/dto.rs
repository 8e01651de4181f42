//! Transport shapes
//!
//! Request and response bodies for every resource. Field constraints are
//! declared with `validator` and checked by handlers before anything touches
//! the database.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    /// Ignored on create
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 3, max = 50, message = "First name must be between 3 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 3, max = 50, message = "Last name must be between 3 and 50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDto {
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 1, max = 100, message = "Name is required and must not exceed 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDto {
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 3, max = 50, message = "First name must be between 3 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 3, max = 50, message = "Last name must be between 3 and 50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    #[serde(default)]
    pub id: i64,
    #[validate(length(min = 3, max = 50, message = "First name must be between 3 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 3, max = 50, message = "Last name must be between 3 and 50 characters"))]
    pub last_name: String,
    pub hire_date: NaiveDateTime,
    #[validate(length(min = 1, max = 100, message = "Job title is required and must not exceed 100 characters"))]
    pub job_title: String,
    pub salary_per_month: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeReviewDto {
    #[serde(default)]
    pub id: i64,
    #[validate(range(min = 0, max = 5, message = "Rating must be between 0 and 5"))]
    pub rating: i32,
    #[validate(length(min = 10, max = 100, message = "Title must be between 10 and 100 characters"))]
    pub title: String,
    #[validate(length(min = 30, max = 500, message = "Content must be between 30 and 500 characters"))]
    pub content: String,
}
