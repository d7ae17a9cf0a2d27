//! Flat wire form of [`LimitAndSort`]
//!
//! On the wire a limit is `{cursor?, direction?, count}`. A cursor and a
//! direction must come together; either one alone is rejected in both
//! conversion directions.

use serde::{Deserialize, Serialize};

use chainread_core::{
    CursorDirection, Error, Limit, LimitAndSort, Result, SortBy, SortDirection,
};

/// What a sort key orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireSortKind {
    /// Block timestamp
    Timestamp,
    /// Block height
    Block,
    /// Sequence position
    Sequence,
}

/// One sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSortBy {
    /// Ordering field
    pub kind: WireSortKind,
    /// Ordering direction
    pub direction: SortDirection,
}

/// Count or cursor limit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireLimit {
    /// Opaque cursor, set for cursor limits
    pub cursor: Option<String>,
    /// Paging direction, set for cursor limits
    pub direction: Option<CursorDirection>,
    /// Page size
    pub count: u64,
}

/// Wire form of [`LimitAndSort`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireLimitAndSort {
    /// Sort keys, most significant first
    pub sort_by: Vec<WireSortBy>,
    /// Limit
    pub limit: WireLimit,
}

impl From<SortBy> for WireSortBy {
    fn from(sort: SortBy) -> Self {
        let (kind, direction) = match sort {
            SortBy::Timestamp(d) => (WireSortKind::Timestamp, d),
            SortBy::Block(d) => (WireSortKind::Block, d),
            SortBy::Sequence(d) => (WireSortKind::Sequence, d),
        };
        WireSortBy { kind, direction }
    }
}

impl From<WireSortBy> for SortBy {
    fn from(sort: WireSortBy) -> Self {
        match sort.kind {
            WireSortKind::Timestamp => SortBy::Timestamp(sort.direction),
            WireSortKind::Block => SortBy::Block(sort.direction),
            WireSortKind::Sequence => SortBy::Sequence(sort.direction),
        }
    }
}

/// Convert to the wire form.
///
/// # Errors
///
/// `InvalidArgument` for a cursor limit with an empty cursor.
pub fn limit_and_sort_to_wire(las: &LimitAndSort) -> Result<WireLimitAndSort> {
    let limit = match &las.limit {
        Limit::Count(count) => WireLimit {
            cursor: None,
            direction: None,
            count: *count,
        },
        Limit::Cursor {
            cursor,
            direction,
            count,
        } => {
            if cursor.is_empty() {
                return Err(Error::invalid_argument(
                    "cursor direction given without a cursor",
                ));
            }
            WireLimit {
                cursor: Some(cursor.clone()),
                direction: Some(*direction),
                count: *count,
            }
        }
    };
    Ok(WireLimitAndSort {
        sort_by: las.sort_by.iter().copied().map(WireSortBy::from).collect(),
        limit,
    })
}

/// Convert from the wire form.
///
/// # Errors
///
/// `InvalidArgument` when a cursor arrives without a direction or a
/// direction without a cursor.
pub fn limit_and_sort_from_wire(wire: &WireLimitAndSort) -> Result<LimitAndSort> {
    let limit = match (&wire.limit.cursor, wire.limit.direction) {
        (None, None) => Limit::Count(wire.limit.count),
        (Some(cursor), None) if cursor.is_empty() => Limit::Count(wire.limit.count),
        (Some(cursor), Some(direction)) if !cursor.is_empty() => Limit::Cursor {
            cursor: cursor.clone(),
            direction,
            count: wire.limit.count,
        },
        (Some(_), None) => {
            return Err(Error::invalid_argument(
                "cursor given without a cursor direction",
            ))
        }
        _ => {
            return Err(Error::invalid_argument(
                "cursor direction given without a cursor",
            ))
        }
    };
    Ok(LimitAndSort {
        sort_by: wire.sort_by.iter().copied().map(SortBy::from).collect(),
        limit,
    })
}
