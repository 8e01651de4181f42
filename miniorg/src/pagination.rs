//! Page envelope for list responses
//!
//! Repositories return the complete ordered result set; handlers slice it
//! into a [`Page`]. Page bounds are validated before a page is built (see
//! [`crate::handlers::ListQuery::validate`]), so construction never fails.
//!
//! ```rust
//! use miniorg::pagination::Page;
//!
//! let page = Page::from_ordered(vec![1, 2, 3, 4, 5], 2, 2);
//! assert_eq!(page.data, vec![3, 4]);
//! assert!(page.has_previous_page);
//! assert!(page.has_next_page);
//! ```

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Smallest accepted page size
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 30;

/// One page of an ordered collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The 1-based page number returned
    pub page_number: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Slice an already ordered collection
    ///
    /// A page past the end is empty with `has_next_page == false`.
    pub fn from_ordered(items: Vec<T>, page_number: u32, page_size: u32) -> Self {
        let total = items.len() as u64;
        let size = u64::from(page_size);
        let skip = u64::from(page_number.saturating_sub(1)).saturating_mul(size);

        let data: Vec<T> = items
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(page_size as usize)
            .collect();

        Self {
            page_number,
            has_previous_page: page_number > 1,
            has_next_page: u64::from(page_number).saturating_mul(size) < total,
            data,
        }
    }

    /// Convert every item, keeping the navigation flags
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_number: self.page_number,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
