//! Persistence shapes
//!
//! One struct per table. Relations are plain foreign-key ids; related rows
//! are loaded by explicit repository queries, never held as references.

use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::ordering::{SortValue, Sortable};

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Manager {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Edge of the department/manager many-to-many relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRow)]
pub struct DepartmentManager {
    pub department_id: i64,
    pub manager_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub hire_date: NaiveDateTime,
    pub job_title: String,
    pub salary_per_month: i32,
    pub department_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EmployeeReview {
    pub id: i64,
    pub rating: i32,
    pub title: String,
    pub content: String,
    pub employee_id: i64,
    pub customer_id: i64,
}

impl Sortable for Customer {
    const SORT_FIELDS: &'static [(&'static str, &'static str)] =
        &[("firstName", "first_name"), ("lastName", "last_name")];

    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, column: &str) -> SortValue<'_> {
        match column {
            "first_name" => SortValue::Text(&self.first_name),
            "last_name" => SortValue::Text(&self.last_name),
            _ => SortValue::Int(self.id),
        }
    }
}

impl Sortable for Department {
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[("name", "name")];

    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, column: &str) -> SortValue<'_> {
        match column {
            "name" => SortValue::Text(&self.name),
            _ => SortValue::Int(self.id),
        }
    }
}

impl Sortable for Manager {
    const SORT_FIELDS: &'static [(&'static str, &'static str)] =
        &[("firstName", "first_name"), ("lastName", "last_name")];

    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, column: &str) -> SortValue<'_> {
        match column {
            "first_name" => SortValue::Text(&self.first_name),
            "last_name" => SortValue::Text(&self.last_name),
            _ => SortValue::Int(self.id),
        }
    }
}

impl Sortable for Employee {
    const SORT_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("hireDate", "hire_date"),
        ("jobTitle", "job_title"),
        ("salaryPerMonth", "salary_per_month"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, column: &str) -> SortValue<'_> {
        match column {
            "first_name" => SortValue::Text(&self.first_name),
            "last_name" => SortValue::Text(&self.last_name),
            "hire_date" => SortValue::DateTime(self.hire_date),
            "job_title" => SortValue::Text(&self.job_title),
            "salary_per_month" => SortValue::Int(i64::from(self.salary_per_month)),
            _ => SortValue::Int(self.id),
        }
    }
}

impl Sortable for EmployeeReview {
    const SORT_FIELDS: &'static [(&'static str, &'static str)] =
        &[("rating", "rating"), ("title", "title"), ("content", "content")];

    fn id(&self) -> i64 {
        self.id
    }

    fn sort_key(&self, column: &str) -> SortValue<'_> {
        match column {
            "rating" => SortValue::Int(i64::from(self.rating)),
            "title" => SortValue::Text(&self.title),
            "content" => SortValue::Text(&self.content),
            _ => SortValue::Int(self.id),
        }
    }
}
