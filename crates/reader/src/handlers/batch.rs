//! BatchGetLatestValues handler.
//!
//! Each read's parameters are decoded independently. A read whose
//! parameters or result fail to convert fails only its own slot; the rest of
//! the batch still runs. Results are returned in request order, per binding
//! and per read.

use std::collections::BTreeSet;

use tracing::warn;

use chainread_core::{
    BatchGetLatestValuesRequest, BatchRead, BoundContract, Context, Error, Result, TypeDescriptor,
};
use chainread_wire::messages::{
    self, BatchGetLatestValuesReply, ContractBatch, ContractBatchResult,
};
use chainread_wire::ReaderReply;

use super::{decode_params, encode_result};
use crate::server::Session;

/// Per-read state carried from decoding to encoding
struct Slot {
    read_name: String,
    ret_type: TypeDescriptor,
    as_value_type: bool,
    /// Set when the read never reached the chain
    failed: Option<Error>,
}

/// Handle BatchGetLatestValues.
pub(crate) fn batch_get_latest_values(
    s: &Session<'_>,
    ctx: &Context,
    req: messages::BatchGetLatestValuesRequest,
) -> Result<ReaderReply> {
    let mut seen = BTreeSet::new();
    for batch in &req.requests {
        if !seen.insert(&batch.contract) {
            return Err(Error::invalid_argument(format!(
                "binding {} appears twice in one batch",
                batch.contract
            )));
        }
    }

    let mut chain_request = BatchGetLatestValuesRequest::new();
    let mut slots: Vec<(BoundContract, Vec<Slot>)> = Vec::with_capacity(req.requests.len());

    for ContractBatch { contract, reads } in req.requests {
        let mut contract_slots = Vec::with_capacity(reads.len());
        let mut chain_reads = Vec::new();
        for read in reads {
            let read_identifier = contract.read_identifier(&read.read_name);
            let prepared = s.resolve_type(&read_identifier, false).and_then(|ret_type| {
                let params = decode_params(s, &read_identifier, &read.params)?;
                Ok((ret_type, params))
            });
            match prepared {
                Ok((ret_type, params)) => {
                    chain_reads.push(BatchRead {
                        read_name: read.read_name.clone(),
                        params,
                        return_type: ret_type.clone(),
                    });
                    contract_slots.push(Slot {
                        read_name: read.read_name,
                        ret_type,
                        as_value_type: read.as_value_type,
                        failed: None,
                    });
                }
                Err(e) => {
                    warn!(
                        target: "chainread::server",
                        read_identifier = %read_identifier,
                        error = %e,
                        "batch read rejected before execution"
                    );
                    contract_slots.push(Slot {
                        read_name: read.read_name,
                        ret_type: TypeDescriptor::Any,
                        as_value_type: read.as_value_type,
                        failed: Some(e),
                    });
                }
            }
        }
        if !chain_reads.is_empty() {
            chain_request.insert(contract.clone(), chain_reads);
        }
        slots.push((contract, contract_slots));
    }

    let mut chain_result = if chain_request.is_empty() {
        Default::default()
    } else {
        s.reader.batch_get_latest_values(ctx, &chain_request)?
    };

    let mut results = Vec::with_capacity(slots.len());
    for (contract, contract_slots) in slots {
        let executed = chain_result.remove(&contract).unwrap_or_default();
        let expected = contract_slots.iter().filter(|slot| slot.failed.is_none()).count();
        if executed.len() != expected {
            return Err(Error::internal(format!(
                "reader returned {} results for {} reads of {}",
                executed.len(),
                expected,
                contract
            )));
        }

        let mut executed = executed.into_iter();
        let mut out = Vec::with_capacity(contract_slots.len());
        for slot in contract_slots {
            let outcome = match slot.failed {
                Some(e) => Err(e),
                None => match executed.next() {
                    Some(item) if item.read_name == slot.read_name => item
                        .result
                        .and_then(|v| encode_result(s, &slot.ret_type, v, slot.as_value_type)),
                    Some(item) => {
                        return Err(Error::internal(format!(
                            "reader answered {} where {} was requested on {}",
                            item.read_name, slot.read_name, contract
                        )))
                    }
                    None => return Err(Error::internal("batch result ended early")),
                },
            };
            out.push(match outcome {
                Ok(encoded) => messages::BatchReadResult {
                    read_name: slot.read_name,
                    return_val: Some(encoded),
                    error: None,
                },
                Err(e) => {
                    warn!(
                        target: "chainread::server",
                        contract = %contract,
                        read_name = %slot.read_name,
                        error = %e,
                        "batch read failed"
                    );
                    messages::BatchReadResult {
                        read_name: slot.read_name,
                        return_val: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }
        results.push(ContractBatchResult {
            contract,
            results: out,
        });
    }

    Ok(ReaderReply::BatchGetLatestValues(
        BatchGetLatestValuesReply { results },
    ))
}
