//! Pagination and ordering of key queries

use serde::{Deserialize, Serialize};

/// Ordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// One sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// By block timestamp
    Timestamp(SortDirection),
    /// By block height
    Block(SortDirection),
    /// By sequence position
    Sequence(SortDirection),
}

/// Which side of a cursor to page towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorDirection {
    /// Items before the cursor
    Preceding,
    /// Items after the cursor
    Following,
}

/// How many items to return, and from where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// First `n` items; `0` means unbounded
    Count(u64),
    /// Page from an opaque cursor
    Cursor {
        /// Cursor returned by a previous query
        cursor: String,
        /// Paging direction
        direction: CursorDirection,
        /// Page size; `0` means unbounded
        count: u64,
    },
}

impl Default for Limit {
    fn default() -> Self {
        Limit::Count(0)
    }
}

/// Pagination plus ordering.
///
/// The limit is either count based or cursor based, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitAndSort {
    /// Sort keys, most significant first
    pub sort_by: Vec<SortBy>,
    /// Limit
    pub limit: Limit,
}

impl LimitAndSort {
    /// Count-based limit with no ordering
    pub fn count_limit(count: u64) -> Self {
        Self {
            sort_by: Vec::new(),
            limit: Limit::Count(count),
        }
    }

    /// Cursor-based limit with no ordering
    pub fn cursor_limit(cursor: impl Into<String>, direction: CursorDirection, count: u64) -> Self {
        Self {
            sort_by: Vec::new(),
            limit: Limit::Cursor {
                cursor: cursor.into(),
                direction,
                count,
            },
        }
    }

    /// Append a sort key
    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort_by.push(sort);
        self
    }

    /// Returns true if the limit pages from a cursor
    pub fn has_cursor(&self) -> bool {
        matches!(self.limit, Limit::Cursor { .. })
    }

    /// Page size, `0` meaning unbounded
    pub fn count(&self) -> u64 {
        match &self.limit {
            Limit::Count(n) => *n,
            Limit::Cursor { count, .. } => *count,
        }
    }
}
