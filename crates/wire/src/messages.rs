//! Request and reply messages, one pair per operation
//!
//! Every payload is a [`VersionedBytes`] envelope; every filter and limit is
//! in its flat wire form. Messages carry no skipped or untagged fields so
//! they marshal identically under any self-describing or positional format.

use serde::{Deserialize, Serialize};

use chainread_core::{BoundContract, ConfidenceLevel, Head, VersionedBytes};

use crate::limit::WireLimitAndSort;
use crate::query::WireKeyFilter;

/// Register or deregister bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindRequest {
    /// Bindings
    pub bindings: Vec<BoundContract>,
}

/// Read the latest value of one read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetLatestValueRequest {
    /// Routable read key
    pub read_identifier: String,
    /// Finality tier
    pub confidence: ConfidenceLevel,
    /// Encoded call parameters
    pub params: VersionedBytes,
    /// Reply with the dynamic scheme regardless of the session default
    pub as_value_type: bool,
}

/// Reply to [`GetLatestValueRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetLatestValueReply {
    /// Encoded result
    pub ret_val: VersionedBytes,
}

/// Reply to a head-data read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetLatestValueWithHeadDataReply {
    /// Encoded result
    pub ret_val: VersionedBytes,
    /// Head observed at read time, absent if the chain reports none
    pub head_data: Option<Head>,
}

/// One read of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRead {
    /// Method name relative to the binding
    pub read_name: String,
    /// Encoded call parameters
    pub params: VersionedBytes,
    /// Reply with the dynamic scheme regardless of the session default
    pub as_value_type: bool,
}

/// The reads of one binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractBatch {
    /// Binding
    pub contract: BoundContract,
    /// Reads, in order
    pub reads: Vec<BatchRead>,
}

/// Read many values at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchGetLatestValuesRequest {
    /// Per-binding reads
    pub requests: Vec<ContractBatch>,
}

/// Outcome of one read of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReadResult {
    /// Method name the result answers
    pub read_name: String,
    /// Encoded value, set on success
    pub return_val: Option<VersionedBytes>,
    /// Rendered error, set on failure
    pub error: Option<String>,
}

/// The results of one binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractBatchResult {
    /// Binding
    pub contract: BoundContract,
    /// Results, in request order
    pub results: Vec<BatchReadResult>,
}

/// Reply to [`BatchGetLatestValuesRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchGetLatestValuesReply {
    /// Per-binding results
    pub results: Vec<ContractBatchResult>,
}

/// Query one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKeyRequest {
    /// Binding queried
    pub contract: BoundContract,
    /// Key and expressions
    pub filter: WireKeyFilter,
    /// Pagination and ordering
    pub limit_and_sort: WireLimitAndSort,
    /// Reply with the dynamic scheme regardless of the session default
    pub as_value_type: bool,
}

/// One sequence on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSequence {
    /// Pagination cursor
    pub cursor: String,
    /// Block metadata
    pub head: Head,
    /// Encoded data
    pub data: VersionedBytes,
}

/// Reply to [`QueryKeyRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKeyReply {
    /// Sequences, in the chain's order
    pub sequences: Vec<WireSequence>,
}

/// One key of a multi-key query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractKeyFilter {
    /// Binding queried
    pub contract: BoundContract,
    /// Key and expressions
    pub filter: WireKeyFilter,
    /// Reply with the dynamic scheme for this key
    pub as_value_type: bool,
}

/// Query several keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKeysRequest {
    /// Keys
    pub filters: Vec<ContractKeyFilter>,
    /// Pagination and ordering, shared by every key
    pub limit_and_sort: WireLimitAndSort,
}

/// A sequence tagged with its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedSequence {
    /// Key
    pub key: String,
    /// Sequence
    pub sequence: WireSequence,
}

/// Reply to [`QueryKeysRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKeysReply {
    /// Sequences of every key
    pub sequences: Vec<KeyedSequence>,
}

/// A request to the reader server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReaderRequest {
    /// Register bindings
    Bind(BindRequest),
    /// Deregister bindings
    Unbind(BindRequest),
    /// Latest value
    GetLatestValue(GetLatestValueRequest),
    /// Latest value with head
    GetLatestValueWithHeadData(GetLatestValueRequest),
    /// Batched reads
    BatchGetLatestValues(BatchGetLatestValuesRequest),
    /// Single-key query
    QueryKey(QueryKeyRequest),
    /// Multi-key query
    QueryKeys(QueryKeysRequest),
}

impl ReaderRequest {
    /// Operation name, for logs and errors
    pub fn operation(&self) -> &'static str {
        match self {
            ReaderRequest::Bind(_) => "Bind",
            ReaderRequest::Unbind(_) => "Unbind",
            ReaderRequest::GetLatestValue(_) => "GetLatestValue",
            ReaderRequest::GetLatestValueWithHeadData(_) => "GetLatestValueWithHeadData",
            ReaderRequest::BatchGetLatestValues(_) => "BatchGetLatestValues",
            ReaderRequest::QueryKey(_) => "QueryKey",
            ReaderRequest::QueryKeys(_) => "QueryKeys",
        }
    }
}

/// A reply from the reader server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReaderReply {
    /// Bindings registered
    Bind,
    /// Bindings deregistered
    Unbind,
    /// Latest value
    GetLatestValue(GetLatestValueReply),
    /// Latest value with head
    GetLatestValueWithHeadData(GetLatestValueWithHeadDataReply),
    /// Batched results
    BatchGetLatestValues(BatchGetLatestValuesReply),
    /// Single-key sequences
    QueryKey(QueryKeyReply),
    /// Multi-key sequences
    QueryKeys(QueryKeysReply),
}

impl ReaderReply {
    /// Operation name, for logs and errors
    pub fn operation(&self) -> &'static str {
        match self {
            ReaderReply::Bind => "Bind",
            ReaderReply::Unbind => "Unbind",
            ReaderReply::GetLatestValue(_) => "GetLatestValue",
            ReaderReply::GetLatestValueWithHeadData(_) => "GetLatestValueWithHeadData",
            ReaderReply::BatchGetLatestValues(_) => "BatchGetLatestValues",
            ReaderReply::QueryKey(_) => "QueryKey",
            ReaderReply::QueryKeys(_) => "QueryKeys",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainread_core::{EncodingVersion, Value};

    #[test]
    fn test_request_json_shape() {
        let req = ReaderRequest::GetLatestValue(GetLatestValueRequest {
            read_identifier: "0xa-Token-balance".into(),
            confidence: ConfidenceLevel::Finalized,
            params: VersionedBytes::encode(&Value::Null, EncodingVersion::Json).unwrap(),
            as_value_type: true,
        });
        let json = serde_json::to_value(&req).unwrap();
        let inner = &json["GetLatestValue"];
        assert_eq!(inner["confidence"], "finalized");
        assert_eq!(inner["as_value_type"], true);
        assert_eq!(inner["params"]["version"], 0);

        let back: ReaderRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.operation(), "GetLatestValue");
    }

    #[test]
    fn test_batch_result_carries_value_or_error() {
        let reply = BatchGetLatestValuesReply {
            results: vec![ContractBatchResult {
                contract: BoundContract::new("0xa", "Token"),
                results: vec![
                    BatchReadResult {
                        read_name: "ok".into(),
                        return_val: Some(
                            VersionedBytes::encode(&1u64, EncodingVersion::Cbor).unwrap(),
                        ),
                        error: None,
                    },
                    BatchReadResult {
                        read_name: "bad".into(),
                        return_val: None,
                        error: Some("not found: x".into()),
                    },
                ],
            }],
        };
        let text = serde_json::to_string(&reply).unwrap();
        let back: BatchGetLatestValuesReply = serde_json::from_str(&text).unwrap();
        assert_eq!(back, reply);
    }
}
