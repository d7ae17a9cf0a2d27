//! Capability traits
//!
//! [`ContractReader`] is the abstract "read this chain" capability. Chain
//! implementations provide it in the worker process; the protocol client
//! provides it in the host, forwarding every call over the wire. Both sides
//! see the same dynamic [`Value`] payloads.
//!
//! [`TypeProvider`] is the single seam between static and dynamic typing:
//! given a read identifier it returns the shape payloads for that read must
//! conform to.

use std::collections::BTreeMap;

use crate::context::Context;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::query::{KeyFilter, LimitAndSort};
use crate::types::{
    BatchGetLatestValuesRequest, BatchGetLatestValuesResult, BoundContract, ConfidenceLevel,
    ContractKeyFilter, Head, KeyedSequence, Sequence,
};
use crate::value::Value;

/// Lifecycle of a long-running service
///
/// Thread safety: all methods may be called concurrently.
pub trait Service: Send + Sync {
    /// Service name, used as the key of its health report entry
    fn name(&self) -> String;

    /// Start the service
    fn start(&self, ctx: &Context) -> Result<()>;

    /// Stop the service and release its resources
    fn close(&self) -> Result<()>;

    /// Fail unless the service is ready to take calls
    fn ready(&self) -> Result<()>;

    /// Name → health of this service and any it owns; `None` is healthy
    fn health_report(&self) -> BTreeMap<String, Option<Error>> {
        let mut report = BTreeMap::new();
        report.insert(self.name(), self.ready().err());
        report
    }
}

/// Read access to on-chain contracts
///
/// Reads are addressed by read identifier
/// ([`BoundContract::read_identifier`]); a contract must be bound before
/// reads against it can resolve.
///
/// # Errors
///
/// Implementations report shape problems as `FieldNotFound`, `NotASequence`
/// or `WrongLength`, and missing results as `NotFound`.
pub trait ContractReader: Service {
    /// Register bindings. Binding an already bound contract is a no-op.
    fn bind(&self, ctx: &Context, bindings: &[BoundContract]) -> Result<()>;

    /// Deregister bindings. Unbinding an unknown contract is a no-op.
    fn unbind(&self, ctx: &Context, bindings: &[BoundContract]) -> Result<()>;

    /// Latest value of one read.
    fn get_latest_value(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value>;

    /// Latest value of one read plus the head it was observed at.
    ///
    /// The head is `None` when the chain does not report one.
    fn get_latest_value_with_head_data(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<(Value, Option<Head>)>;

    /// Execute many reads at once.
    ///
    /// The result has an entry per requested binding, holding one result
    /// per read in request order. A failing read fails only its own slot.
    fn batch_get_latest_values(
        &self,
        ctx: &Context,
        request: &BatchGetLatestValuesRequest,
    ) -> Result<BatchGetLatestValuesResult>;

    /// Sequences matching one key filter.
    fn query_key(
        &self,
        ctx: &Context,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
        sequence_type: &TypeDescriptor,
    ) -> Result<Vec<Sequence<Value>>>;

    /// Sequences matching several key filters, each tagged with its key.
    fn query_keys(
        &self,
        ctx: &Context,
        filters: &[ContractKeyFilter],
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<KeyedSequence>>;

    /// Type descriptors for this reader's reads, if it supplies any
    fn type_provider(&self) -> Option<&dyn TypeProvider> {
        None
    }
}

/// Resolves the concrete payload shape of a read or key
pub trait TypeProvider: Send + Sync {
    /// Descriptor for `read_identifier`.
    ///
    /// `for_encoding` selects the call parameters; otherwise the result
    /// (or, for keys, the sequence data).
    fn create_contract_type(
        &self,
        read_identifier: &str,
        for_encoding: bool,
    ) -> Result<TypeDescriptor>;
}
