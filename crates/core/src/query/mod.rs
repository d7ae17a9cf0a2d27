//! Query expression language
//!
//! A key query is a [`KeyFilter`]: a key name plus an ordered list of
//! [`Expression`]s. Each expression is either a leaf [`Primitive`] or a
//! [`BoolExpression`] combining two or more children with `And`/`Or`.
//!
//! Chain-specific filters plug in through [`Primitive::Extension`], which
//! carries an identifier and an opaque payload. Code that walks the tree
//! implements [`Visitor`]; a visitor that does not understand an extension
//! fails rather than dropping it.
//!
//! Pagination and ordering live in [`LimitAndSort`].

mod expression;
mod limit;
mod primitive;

pub use expression::{and, or, where_key, BoolExpression, BoolOperator, Expression, KeyFilter};
pub use limit::{CursorDirection, Limit, LimitAndSort, SortBy, SortDirection};
pub use primitive::{
    block, comparator, confidence, extension, timestamp, tx_hash, ComparisonOperator,
    ExtensionPrimitive, Primitive, ValueComparator, Visitor,
};
