//! Core types and traits for chainread
//!
//! This crate defines everything both sides of the reader protocol share:
//! - Error: the reader error vocabulary
//! - Value: dynamic value model, with serde conversion to and from any type
//! - TypeDescriptor: per-call payload shapes
//! - Codec: the versioned envelope and its four encoding schemes
//! - Query: key filters, boolean expressions, LimitAndSort
//! - Types: bindings, confidence levels, heads, sequences, batch shapes
//! - Traits: Service, ContractReader, TypeProvider
//! - Context and ReaderConfig

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;
pub mod value;

pub use codec::{decode, encode, encode_tagged, EncodingVersion, VersionedBytes};
pub use config::{ReaderConfig, CONFIG_FILE_NAME};
pub use context::Context;
pub use descriptor::{FieldDescriptor, TypeDescriptor};
pub use error::{Error, Result};
pub use query::{
    and, block, comparator, confidence, extension, or, timestamp, tx_hash, where_key,
    BoolExpression, BoolOperator, ComparisonOperator, CursorDirection, Expression,
    ExtensionPrimitive, KeyFilter, Limit, LimitAndSort, Primitive, SortBy, SortDirection,
    ValueComparator, Visitor,
};
pub use traits::{ContractReader, Service, TypeProvider};
pub use types::{
    BatchGetLatestValuesRequest, BatchGetLatestValuesResult, BatchRead, BatchReadResult,
    BoundContract, ConfidenceLevel, ContractKeyFilter, Head, KeyedSequence, ReadIdentifier,
    Sequence,
};
pub use value::{from_value, from_value_lenient, to_value, Value};
