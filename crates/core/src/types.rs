//! Chain-agnostic read types
//!
//! This module defines:
//! - BoundContract: address + name of one on-chain contract, and the
//!   read identifiers derived from it
//! - ConfidenceLevel: finality tier a read may observe
//! - Head / Sequence: query results with their block metadata
//! - Batch request and result shapes

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::query::KeyFilter;
use crate::value::{from_value, Value};

// =============================================================================
// Bindings
// =============================================================================

/// A chain binding: the address and logical name of one contract.
///
/// Ordered and hashable so it can key batch requests. Its `Display` form
/// (`address-name`) is the canonical correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoundContract {
    /// On-chain address
    pub address: String,
    /// Logical contract name
    pub name: String,
}

impl BoundContract {
    /// Create a binding
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Compose the routable key for `method` on this contract.
    pub fn read_identifier(&self, method: &str) -> String {
        format!("{}-{}-{}", self.address, self.name, method)
    }

    /// Returns true if both address and name are set
    pub fn is_complete(&self) -> bool {
        !self.address.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for BoundContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.address, self.name)
    }
}

/// A read identifier split back into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadIdentifier {
    /// The contract the read targets
    pub contract: BoundContract,
    /// Method or event name
    pub method: String,
}

impl ReadIdentifier {
    /// Parse `address-name-method`.
    ///
    /// The address ends at the first `-` and the method starts after the
    /// last one, so contract names may themselves contain dashes.
    pub fn parse(identifier: &str) -> Result<Self> {
        let malformed =
            || Error::invalid_argument(format!("malformed read identifier '{}'", identifier));
        let (address, rest) = identifier.split_once('-').ok_or_else(malformed)?;
        let (name, method) = rest.rsplit_once('-').ok_or_else(malformed)?;
        if address.is_empty() || name.is_empty() || method.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            contract: BoundContract::new(address, name),
            method: method.to_string(),
        })
    }
}

impl fmt::Display for ReadIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contract.read_identifier(&self.method))
    }
}

// =============================================================================
// Confidence
// =============================================================================

/// Finality tier a read observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Latest state, may be reorganized away
    Unconfirmed,
    /// Finalized state
    Finalized,
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::Unconfirmed
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Unconfirmed => f.write_str("unconfirmed"),
            ConfidenceLevel::Finalized => f.write_str("finalized"),
        }
    }
}

// =============================================================================
// Query results
// =============================================================================

/// Block metadata observed at read time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    /// Block height, decimal
    pub height: String,
    /// Block hash
    pub hash: Vec<u8>,
    /// Block timestamp, seconds since epoch
    pub timestamp: u64,
}

/// One result of a key query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence<T = Value> {
    /// Pagination cursor pointing at this item
    pub cursor: String,
    /// Block the item was observed in
    pub head: Head,
    /// Decoded item
    pub data: T,
}

impl<T> Sequence<T> {
    /// Map the data to a new type
    pub fn map<U, F>(self, f: F) -> Sequence<U>
    where
        F: FnOnce(T) -> U,
    {
        Sequence {
            cursor: self.cursor,
            head: self.head,
            data: f(self.data),
        }
    }
}

impl Sequence<Value> {
    /// Decode the dynamic data into a concrete type
    pub fn decode<T: DeserializeOwned>(self) -> Result<Sequence<T>> {
        Ok(Sequence {
            cursor: self.cursor,
            head: self.head,
            data: from_value(self.data)?,
        })
    }
}

/// A sequence tagged with the key it answers
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSequence {
    /// Key the sequence belongs to
    pub key: String,
    /// The sequence itself
    pub sequence: Sequence<Value>,
}

/// One key query against one contract, for multi-key queries
#[derive(Debug, Clone, PartialEq)]
pub struct ContractKeyFilter {
    /// Contract queried
    pub contract: BoundContract,
    /// Key and expressions
    pub filter: KeyFilter,
    /// Expected shape of each sequence's data
    pub sequence_type: TypeDescriptor,
}

// =============================================================================
// Batches
// =============================================================================

/// One named read inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRead {
    /// Method name, relative to the binding
    pub read_name: String,
    /// Call parameters
    pub params: Value,
    /// Shape the result must conform to; `Any` keeps the dynamic value
    pub return_type: TypeDescriptor,
}

impl BatchRead {
    /// A read whose result is kept as a dynamic value
    pub fn new(read_name: impl Into<String>, params: Value) -> Self {
        Self {
            read_name: read_name.into(),
            params,
            return_type: TypeDescriptor::Any,
        }
    }

    /// Set the expected result shape
    pub fn returning(mut self, return_type: TypeDescriptor) -> Self {
        self.return_type = return_type;
        self
    }
}

/// Outcome of one read inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReadResult {
    /// Method name the result answers
    pub read_name: String,
    /// Value or per-item error
    pub result: Result<Value>,
}

impl BatchReadResult {
    /// A successful item
    pub fn ok(read_name: impl Into<String>, value: Value) -> Self {
        Self {
            read_name: read_name.into(),
            result: Ok(value),
        }
    }

    /// A failed item
    pub fn err(read_name: impl Into<String>, error: Error) -> Self {
        Self {
            read_name: read_name.into(),
            result: Err(error),
        }
    }

    /// Decode the value into a concrete type, or surface the item's error
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.result {
            Ok(value) => from_value(value.clone()),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Binding → ordered reads
pub type BatchGetLatestValuesRequest = BTreeMap<BoundContract, Vec<BatchRead>>;

/// Binding → ordered results, mirroring the request
pub type BatchGetLatestValuesResult = BTreeMap<BoundContract, Vec<BatchReadResult>>;
