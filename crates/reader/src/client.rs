//! The reader client - a [`ContractReader`] that forwards over a transport.
//!
//! Payloads are encoded with the session default encoding and decoded by
//! their own envelope tag. When the caller's target is the dynamic
//! [`Value`], the request asks the server to reply in the dynamic scheme so
//! the full shape survives the trip.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use chainread_core::{
    BatchGetLatestValuesRequest, BatchGetLatestValuesResult, BatchReadResult, BoundContract,
    ConfidenceLevel, ContractKeyFilter, ContractReader, Context, EncodingVersion, Error, Head,
    KeyFilter, KeyedSequence, LimitAndSort, ReaderConfig, Result, Sequence, Service,
    TypeDescriptor, Value, VersionedBytes,
};
use chainread_wire::messages::{
    self, BindRequest, ContractBatch, GetLatestValueRequest, QueryKeyRequest, QueryKeysRequest,
    WireSequence,
};
use chainread_wire::{
    limit_and_sort_to_wire, ExpressionCodec, PrimitiveRegistry, ReaderReply, ReaderRequest,
};

use crate::transport::Transport;

/// Returns true when `T` is the dynamic value type
fn is_value_type<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<Value>()
}

fn unexpected(expected: &str, reply: &ReaderReply) -> Error {
    Error::internal(format!(
        "expected {} reply, got {}",
        expected,
        reply.operation()
    ))
}

/// Host-side contract reader.
///
/// # Example
///
/// ```ignore
/// let client = ContractReaderClient::new(transport);
/// let price: u64 = client.get_latest_value_as(
///     &Context::background(),
///     &feed.read_identifier("latestPrice"),
///     ConfidenceLevel::Finalized,
///     &(),
/// )?;
/// ```
pub struct ContractReaderClient {
    transport: Arc<dyn Transport>,
    encoding: EncodingVersion,
    call_timeout: Option<Duration>,
    registry: Arc<PrimitiveRegistry>,
}

impl ContractReaderClient {
    /// Client over `transport` using the default encoding
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            encoding: EncodingVersion::default(),
            call_timeout: None,
            registry: Arc::new(PrimitiveRegistry::new()),
        }
    }

    /// Client over `transport` with settings from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configured encoding is unknown.
    pub fn from_config(transport: Arc<dyn Transport>, config: &ReaderConfig) -> Result<Self> {
        Ok(Self {
            encoding: config.encoding()?,
            call_timeout: config.call_timeout(),
            ..Self::new(transport)
        })
    }

    /// Encode outgoing payloads with `encoding`
    pub fn with_encoding(mut self, encoding: EncodingVersion) -> Self {
        self.encoding = encoding;
        self
    }

    /// Translate chain-specific primitives with `registry`
    pub fn with_registry(mut self, registry: Arc<PrimitiveRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Session default encoding
    pub fn encoding(&self) -> EncodingVersion {
        self.encoding
    }

    fn call(&self, ctx: &Context, request: ReaderRequest) -> Result<ReaderReply> {
        let ctx = match (self.call_timeout, ctx.deadline()) {
            (Some(timeout), None) => ctx.with_timeout(timeout),
            _ => ctx.clone(),
        };
        ctx.check()?;

        let operation = request.operation();
        debug!(target: "chainread::client", operation, "sending request");
        let reply = self
            .transport
            .call(&ctx, request)
            .map_err(|e| e.into_error())?;

        // A reply that arrives after cancellation is abandoned
        ctx.check()?;
        if reply.operation() != operation {
            return Err(unexpected(operation, &reply));
        }
        Ok(reply)
    }

    fn read_latest<P, T>(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &P,
        with_head: bool,
    ) -> Result<(T, Option<Head>)>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + 'static,
    {
        let req = GetLatestValueRequest {
            read_identifier: read_identifier.to_string(),
            confidence,
            params: VersionedBytes::encode(params, self.encoding)?,
            as_value_type: is_value_type::<T>(),
        };
        if with_head {
            match self.call(ctx, ReaderRequest::GetLatestValueWithHeadData(req))? {
                ReaderReply::GetLatestValueWithHeadData(reply) => {
                    Ok((reply.ret_val.decode()?, reply.head_data))
                }
                other => Err(unexpected("GetLatestValueWithHeadData", &other)),
            }
        } else {
            match self.call(ctx, ReaderRequest::GetLatestValue(req))? {
                ReaderReply::GetLatestValue(reply) => Ok((reply.ret_val.decode()?, None)),
                other => Err(unexpected("GetLatestValue", &other)),
            }
        }
    }

    /// Latest value of a read, decoded into `T`.
    ///
    /// `T` may be any deserializable type, including `Box<_>` and [`Value`].
    pub fn get_latest_value_as<P, T>(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &P,
    ) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + 'static,
    {
        self.read_latest(ctx, read_identifier, confidence, params, false)
            .map(|(value, _)| value)
    }

    /// Latest value of a read plus head metadata, decoded into `T`.
    pub fn get_latest_value_with_head_data_as<P, T>(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &P,
    ) -> Result<(T, Option<Head>)>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + 'static,
    {
        self.read_latest(ctx, read_identifier, confidence, params, true)
    }

    fn query_key_raw(
        &self,
        ctx: &Context,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
        as_value_type: bool,
    ) -> Result<Vec<WireSequence>> {
        let req = QueryKeyRequest {
            contract: contract.clone(),
            filter: self.expressions().key_filter_to_wire(filter)?,
            limit_and_sort: limit_and_sort_to_wire(limit_and_sort)?,
            as_value_type,
        };
        match self.call(ctx, ReaderRequest::QueryKey(req))? {
            ReaderReply::QueryKey(reply) => Ok(reply.sequences),
            other => Err(unexpected("QueryKey", &other)),
        }
    }

    /// Sequences of one key, each decoded into a fresh `T`.
    pub fn query_key_as<T>(
        &self,
        ctx: &Context,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<Sequence<T>>>
    where
        T: DeserializeOwned + 'static,
    {
        self.query_key_raw(ctx, contract, filter, limit_and_sort, is_value_type::<T>())?
            .into_iter()
            .map(|seq| {
                Ok(Sequence {
                    data: seq.data.decode::<T>()?,
                    cursor: seq.cursor,
                    head: seq.head,
                })
            })
            .collect()
    }

    fn expressions(&self) -> ExpressionCodec<'_> {
        ExpressionCodec::new(self.encoding, &self.registry)
    }
}

fn decode_sequence(seq: WireSequence, ty: &TypeDescriptor) -> Result<Sequence<Value>> {
    let data: Value = seq.data.decode()?;
    Ok(Sequence {
        cursor: seq.cursor,
        head: seq.head,
        data: ty.conform(data)?,
    })
}

impl Service for ContractReaderClient {
    fn name(&self) -> String {
        self.transport.name()
    }

    fn start(&self, ctx: &Context) -> Result<()> {
        self.transport.start(ctx)
    }

    fn close(&self) -> Result<()> {
        self.transport.close()
    }

    fn ready(&self) -> Result<()> {
        self.transport.ready()
    }

    fn health_report(&self) -> BTreeMap<String, Option<Error>> {
        self.transport.health_report()
    }
}

impl ContractReader for ContractReaderClient {
    fn bind(&self, ctx: &Context, bindings: &[BoundContract]) -> Result<()> {
        let req = BindRequest {
            bindings: bindings.to_vec(),
        };
        match self.call(ctx, ReaderRequest::Bind(req))? {
            ReaderReply::Bind => Ok(()),
            other => Err(unexpected("Bind", &other)),
        }
    }

    fn unbind(&self, ctx: &Context, bindings: &[BoundContract]) -> Result<()> {
        let req = BindRequest {
            bindings: bindings.to_vec(),
        };
        match self.call(ctx, ReaderRequest::Unbind(req))? {
            ReaderReply::Unbind => Ok(()),
            other => Err(unexpected("Unbind", &other)),
        }
    }

    fn get_latest_value(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<Value> {
        self.get_latest_value_as(ctx, read_identifier, confidence, params)
    }

    fn get_latest_value_with_head_data(
        &self,
        ctx: &Context,
        read_identifier: &str,
        confidence: ConfidenceLevel,
        params: &Value,
    ) -> Result<(Value, Option<Head>)> {
        self.get_latest_value_with_head_data_as(ctx, read_identifier, confidence, params)
    }

    fn batch_get_latest_values(
        &self,
        ctx: &Context,
        request: &BatchGetLatestValuesRequest,
    ) -> Result<BatchGetLatestValuesResult> {
        let mut requests = Vec::with_capacity(request.len());
        for (contract, reads) in request {
            let reads = reads
                .iter()
                .map(|read| {
                    Ok(messages::BatchRead {
                        read_name: read.read_name.clone(),
                        params: VersionedBytes::encode(&read.params, self.encoding)?,
                        as_value_type: read.return_type.is_any(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            requests.push(ContractBatch {
                contract: contract.clone(),
                reads,
            });
        }

        let reply = match self.call(
            ctx,
            ReaderRequest::BatchGetLatestValues(messages::BatchGetLatestValuesRequest {
                requests,
            }),
        )? {
            ReaderReply::BatchGetLatestValues(reply) => reply,
            other => return Err(unexpected("BatchGetLatestValues", &other)),
        };

        let mut by_contract: BTreeMap<BoundContract, Vec<messages::BatchReadResult>> = reply
            .results
            .into_iter()
            .map(|r| (r.contract, r.results))
            .collect();

        // Results are always fresh values shaped by each read's own return type
        let mut result = BatchGetLatestValuesResult::new();
        for (contract, reads) in request {
            let items = by_contract.remove(contract).ok_or_else(|| {
                Error::internal(format!("batch reply has no results for {}", contract))
            })?;
            if items.len() != reads.len() {
                return Err(Error::internal(format!(
                    "batch reply has {} results for {} reads of {}",
                    items.len(),
                    reads.len(),
                    contract
                )));
            }
            let mut out = Vec::with_capacity(items.len());
            for (read, item) in reads.iter().zip(items) {
                if item.read_name != read.read_name {
                    return Err(Error::internal(format!(
                        "batch reply answered {} where {} was requested on {}",
                        item.read_name, read.read_name, contract
                    )));
                }
                let value = match (item.return_val, item.error) {
                    (_, Some(message)) => Err(Error::Remote { message }),
                    (Some(payload), None) => payload
                        .decode::<Value>()
                        .and_then(|v| read.return_type.conform(v)),
                    (None, None) => Err(Error::internal(format!(
                        "batch reply for {} carries neither value nor error",
                        read.read_name
                    ))),
                };
                out.push(BatchReadResult {
                    read_name: item.read_name,
                    result: value,
                });
            }
            result.insert(contract.clone(), out);
        }
        Ok(result)
    }

    fn query_key(
        &self,
        ctx: &Context,
        contract: &BoundContract,
        filter: &KeyFilter,
        limit_and_sort: &LimitAndSort,
        sequence_type: &TypeDescriptor,
    ) -> Result<Vec<Sequence<Value>>> {
        self.query_key_raw(ctx, contract, filter, limit_and_sort, sequence_type.is_any())?
            .into_iter()
            .map(|seq| decode_sequence(seq, sequence_type))
            .collect()
    }

    fn query_keys(
        &self,
        ctx: &Context,
        filters: &[ContractKeyFilter],
        limit_and_sort: &LimitAndSort,
    ) -> Result<Vec<KeyedSequence>> {
        let codec = self.expressions();
        let mut types: BTreeMap<&str, &TypeDescriptor> = BTreeMap::new();
        let mut wire_filters = Vec::with_capacity(filters.len());
        for f in filters {
            types.entry(f.filter.key.as_str()).or_insert(&f.sequence_type);
            wire_filters.push(messages::ContractKeyFilter {
                contract: f.contract.clone(),
                filter: codec.key_filter_to_wire(&f.filter)?,
                as_value_type: f.sequence_type.is_any(),
            });
        }
        let req = QueryKeysRequest {
            filters: wire_filters,
            limit_and_sort: limit_and_sort_to_wire(limit_and_sort)?,
        };
        let reply = match self.call(ctx, ReaderRequest::QueryKeys(req))? {
            ReaderReply::QueryKeys(reply) => reply,
            other => return Err(unexpected("QueryKeys", &other)),
        };

        reply
            .sequences
            .into_iter()
            .map(|keyed| {
                let ty = types.get(keyed.key.as_str()).copied().ok_or_else(|| {
                    Error::internal(format!("reply carries unrequested key {}", keyed.key))
                })?;
                Ok(KeyedSequence {
                    sequence: decode_sequence(keyed.sequence, ty)?,
                    key: keyed.key,
                })
            })
            .collect()
    }
}
