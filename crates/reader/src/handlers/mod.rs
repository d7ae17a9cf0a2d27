//! Request handlers organized by operation family.
//!
//! | Module | Operations |
//! |--------|------------|
//! | `bind` | Bind, Unbind |
//! | `read` | GetLatestValue, GetLatestValueWithHeadData |
//! | `batch` | BatchGetLatestValues |
//! | `query` | QueryKey, QueryKeys |

pub mod batch;
pub mod bind;
pub mod query;
pub mod read;

use chainread_core::{Result, TypeDescriptor, Value, VersionedBytes};

use crate::server::Session;

/// Decode call parameters and conform them to the read's parameter type.
pub(crate) fn decode_params(
    s: &Session<'_>,
    read_identifier: &str,
    params: &VersionedBytes,
) -> Result<Value> {
    let ty = s.resolve_type(read_identifier, true)?;
    let raw: Value = params.decode()?;
    ty.conform(raw)
}

/// Conform a result to `ty` and encode it for the reply.
pub(crate) fn encode_result(
    s: &Session<'_>,
    ty: &TypeDescriptor,
    value: Value,
    as_value_type: bool,
) -> Result<VersionedBytes> {
    let value = ty.conform(value)?;
    VersionedBytes::encode(&value, s.reply_encoding(as_value_type))
}
