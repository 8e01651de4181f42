//! Ordering policy for list queries
//!
//! Each entity publishes a fixed table of sortable fields via [`Sortable`].
//! A requested field name is matched case-insensitively against that table;
//! anything unrecognized falls back to `id`. Ties on the sort key are always
//! broken by `id` ascending so results are deterministic. Text keys compare
//! with ASCII case folded (SQLite `NOCASE`), so `adams` sorts before `Clark`.
//!
//! The same resolved [`OrderBy`] renders an SQL `ORDER BY` clause for the
//! repositories and compares values in memory.
//!
//! # Example
//!
//! ```rust
//! use miniorg::models::Customer;
//! use miniorg::ordering::{OrderBy, OrderDirection};
//!
//! let order = OrderBy::resolve::<Customer>("LASTNAME", true);
//! assert_eq!(order.column(), "last_name");
//! assert_eq!(order.direction(), OrderDirection::Descending);
//! assert_eq!(order.to_sql(), "ORDER BY last_name COLLATE NOCASE DESC, id ASC");
//!
//! let fallback = OrderBy::resolve::<Customer>("salary", false);
//! assert_eq!(fallback.to_sql(), "ORDER BY id ASC");
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;

/// Column every entity falls back to
pub const ID_COLUMN: &str = "id";

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9, oldest first)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0, newest first)
    Descending,
}

impl OrderDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// A typed sort key extracted from an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Int(i64),
    Text(&'a str),
    DateTime(NaiveDateTime),
}

impl SortValue<'_> {
    /// Same order as SQLite's `NOCASE` collation for text
    pub fn collate(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a
                .bytes()
                .map(|c| c.to_ascii_lowercase())
                .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
            _ => self.cmp(other),
        }
    }
}

/// Entities that can be ordered by a request-supplied field name
pub trait Sortable {
    /// `(query name, column)` pairs accepted besides `id`
    const SORT_FIELDS: &'static [(&'static str, &'static str)];

    fn id(&self) -> i64;

    /// Sort key for one of the columns in [`Self::SORT_FIELDS`]; any other
    /// column yields the id.
    fn sort_key(&self, column: &str) -> SortValue<'_>;
}

/// A resolved ordering: a whitelisted column plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    column: &'static str,
    direction: OrderDirection,
}

impl Default for OrderBy {
    fn default() -> Self {
        Self {
            column: ID_COLUMN,
            direction: OrderDirection::Ascending,
        }
    }
}

impl OrderBy {
    /// Resolve a field name against `T`'s sortable fields
    pub fn resolve<T: Sortable>(field: &str, descending: bool) -> Self {
        let column = T::SORT_FIELDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field.trim()))
            .map(|(_, column)| *column)
            .unwrap_or(ID_COLUMN);

        Self {
            column,
            direction: OrderDirection::from_descending(descending),
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// Render as an SQL clause. The column always comes from a static table.
    ///
    /// `NOCASE` only changes how TEXT values compare, so it is safe on the
    /// numeric and date columns too.
    pub fn to_sql(&self) -> String {
        if self.column == ID_COLUMN {
            format!("ORDER BY {} {}", ID_COLUMN, self.direction.as_sql())
        } else {
            format!(
                "ORDER BY {} COLLATE NOCASE {}, {} ASC",
                self.column,
                self.direction.as_sql(),
                ID_COLUMN
            )
        }
    }

    pub fn compare<T: Sortable>(&self, a: &T, b: &T) -> Ordering {
        let primary = if self.column == ID_COLUMN {
            a.id().cmp(&b.id())
        } else {
            a.sort_key(self.column).collate(&b.sort_key(self.column))
        };

        let primary = match self.direction {
            OrderDirection::Ascending => primary,
            OrderDirection::Descending => primary.reverse(),
        };

        primary.then_with(|| a.id().cmp(&b.id()))
    }

    /// Sort a collection in place
    pub fn apply<T: Sortable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}
