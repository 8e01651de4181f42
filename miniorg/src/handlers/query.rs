//! Query parameters shared by list endpoints
//!
//! # Example
//!
//! ```rust
//! use miniorg::handlers::ListQuery;
//! use miniorg::models::Customer;
//!
//! let query: ListQuery = serde_json::from_str(r#"{"orderBy":"lastName","decsending":true}"#).unwrap();
//! assert!(query.validate().is_ok());
//! assert_eq!(query.order::<Customer>().to_sql(), "ORDER BY last_name COLLATE NOCASE DESC, id ASC");
//!
//! let page = query.page(vec![1, 2, 3]);
//! assert_eq!(page.page_number, 1);
//! ```

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::ordering::{OrderBy, Sortable};
use crate::pagination::{Page, MAX_PAGE_SIZE, MIN_PAGE_SIZE};

/// Page size used when the request does not name one
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Most ids a create request may link the new row to
pub const MAX_LINKED_IDS: usize = 10;

/// Ordering and paging parameters
///
/// `decsending` keeps the spelling existing clients send; `descending` is
/// accepted too, and either takes `true`/`false` in any letter case. Page bounds are plain integers so that out-of-range values
/// reach [`ListQuery::validate`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub order_by: String,
    #[serde(alias = "descending", deserialize_with = "any_case_bool")]
    pub decsending: bool,
    pub page_number: i64,
    pub page_size: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            order_by: "id".to_string(),
            decsending: false,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Reject page numbers below 1 and sizes outside `1..=30`
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page_number < 1 {
            return Err(ApiError::bad_request("pageNumber must be at least 1"));
        }
        if self.page_size < i64::from(MIN_PAGE_SIZE) || self.page_size > i64::from(MAX_PAGE_SIZE) {
            return Err(ApiError::bad_request(format!(
                "pageSize must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn order<T: Sortable>(&self) -> OrderBy {
        OrderBy::resolve::<T>(&self.order_by, self.decsending)
    }

    /// Slice an ordered result set; call after [`Self::validate`]
    pub fn page<T>(&self, items: Vec<T>) -> Page<T> {
        let page_number = u32::try_from(self.page_number.max(1)).unwrap_or(u32::MAX);
        let page_size = u32::try_from(self.page_size.clamp(i64::from(MIN_PAGE_SIZE), i64::from(MAX_PAGE_SIZE)))
            .unwrap_or(MAX_PAGE_SIZE);
        Page::from_ordered(items, page_number, page_size)
    }
}

/// `true`, `True`, `FALSE` and friends, from a query string or a JSON bool
fn any_case_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    struct AnyCaseBool;

    impl Visitor<'_> for AnyCaseBool {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("true or false")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            match value.trim() {
                v if v.eq_ignore_ascii_case("true") => Ok(true),
                v if v.eq_ignore_ascii_case("false") => Ok(false),
                _ => Err(E::invalid_value(Unexpected::Str(value), &self)),
            }
        }
    }

    deserializer.deserialize_any(AnyCaseBool)
}

/// Every value of a repeated integer query parameter
///
/// `managerIds=1&managerIds=2` yields `[1, 2]`. The key is matched
/// case-insensitively; a value that is not an integer is a bad request.
pub fn id_list(raw_query: Option<&str>, key: &str) -> Result<Vec<i64>, ApiError> {
    let Some(raw) = raw_query else {
        return Ok(Vec::new());
    };

    url::form_urlencoded::parse(raw.as_bytes())
        .filter(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::bad_request(format!("{} must contain integers, got '{}'", key, value)))
        })
        .collect()
}

/// [`id_list`] for the ids a new row is linked to: at least one, at most
/// [`MAX_LINKED_IDS`]
pub fn linked_ids(raw_query: Option<&str>, key: &str) -> Result<Vec<i64>, ApiError> {
    let ids = id_list(raw_query, key)?;
    if ids.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", key)));
    }
    if ids.len() > MAX_LINKED_IDS {
        return Err(ApiError::bad_request(format!(
            "{} accepts at most {} ids, got {}",
            key,
            MAX_LINKED_IDS,
            ids.len()
        )));
    }
    Ok(ids)
}
