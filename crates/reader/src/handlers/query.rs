//! QueryKey and QueryKeys handlers.

use std::collections::BTreeMap;

use chainread_core::{ContractKeyFilter, Context, Result, Sequence, TypeDescriptor, Value};
use chainread_wire::messages::{
    self, KeyedSequence, QueryKeyReply, QueryKeyRequest, QueryKeysReply, QueryKeysRequest,
    WireSequence,
};
use chainread_wire::{limit_and_sort_from_wire, ReaderReply};

use super::encode_result;
use crate::server::Session;

fn sequence_to_wire(
    s: &Session<'_>,
    ty: &TypeDescriptor,
    sequence: Sequence<Value>,
    as_value_type: bool,
) -> Result<WireSequence> {
    Ok(WireSequence {
        cursor: sequence.cursor,
        head: sequence.head,
        data: encode_result(s, ty, sequence.data, as_value_type)?,
    })
}

/// Handle QueryKey.
pub(crate) fn query_key(
    s: &Session<'_>,
    ctx: &Context,
    req: QueryKeyRequest,
) -> Result<ReaderReply> {
    let filter = s.expressions().key_filter_from_wire(&req.filter)?;
    let limit_and_sort = limit_and_sort_from_wire(&req.limit_and_sort)?;
    let ty = s.resolve_type(&req.contract.read_identifier(&filter.key), false)?;

    let sequences = s
        .reader
        .query_key(ctx, &req.contract, &filter, &limit_and_sort, &ty)?;

    Ok(ReaderReply::QueryKey(QueryKeyReply {
        sequences: sequences
            .into_iter()
            .map(|seq| sequence_to_wire(s, &ty, seq, req.as_value_type))
            .collect::<Result<Vec<_>>>()?,
    }))
}

/// Handle QueryKeys.
pub(crate) fn query_keys(
    s: &Session<'_>,
    ctx: &Context,
    req: QueryKeysRequest,
) -> Result<ReaderReply> {
    let limit_and_sort = limit_and_sort_from_wire(&req.limit_and_sort)?;

    // Replies are tagged by key only, so the first filter for a key decides
    // how its sequences are encoded.
    let mut encodings: BTreeMap<String, (TypeDescriptor, bool)> = BTreeMap::new();
    let mut filters = Vec::with_capacity(req.filters.len());
    for messages::ContractKeyFilter {
        contract,
        filter,
        as_value_type,
    } in req.filters
    {
        let filter = s.expressions().key_filter_from_wire(&filter)?;
        let sequence_type = s.resolve_type(&contract.read_identifier(&filter.key), false)?;
        encodings
            .entry(filter.key.clone())
            .or_insert_with(|| (sequence_type.clone(), as_value_type));
        filters.push(ContractKeyFilter {
            contract,
            filter,
            sequence_type,
        });
    }

    let keyed = s.reader.query_keys(ctx, &filters, &limit_and_sort)?;

    let mut sequences = Vec::with_capacity(keyed.len());
    for item in keyed {
        let (ty, as_value_type) = encodings
            .get(&item.key)
            .cloned()
            .unwrap_or((TypeDescriptor::Any, true));
        sequences.push(KeyedSequence {
            sequence: sequence_to_wire(s, &ty, item.sequence, as_value_type)?,
            key: item.key,
        });
    }

    Ok(ReaderReply::QueryKeys(QueryKeysReply { sequences }))
}
