//! Wire protocol for the chainread contract reader
//!
//! Everything that crosses the process boundary is defined here:
//! - Messages: request/reply pairs, one per reader operation
//! - Query: the flat wire form of key filters and expression trees
//! - Limit: the flat wire form of LimitAndSort
//! - Registry: translators for chain-specific primitives
//! - Error: `{code, message, detail}` errors and their reconstruction
//!
//! All types derive serde and are format agnostic; the transport picks the
//! byte format.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limit;
pub mod messages;
pub mod query;
pub mod registry;

pub use error::{ErrorCode, WireError};
pub use limit::{
    limit_and_sort_from_wire, limit_and_sort_to_wire, WireLimit, WireLimitAndSort, WireSortBy,
    WireSortKind,
};
pub use messages::{ReaderReply, ReaderRequest};
pub use query::{
    ExpressionCodec, WireBoolExpression, WireEvaluator, WireExpression, WireKeyFilter,
    WirePrimitive, WireValueComparator,
};
pub use registry::{CodecTranslator, PrimitiveRegistry, PrimitiveTranslator};
