//! GetLatestValue handlers.
//!
//! Parameters are decoded by their own envelope tag and conformed to the
//! read's parameter type; results are conformed to the read's result type
//! and encoded in the session encoding, or the dynamic scheme when the
//! caller asked for a dynamic value.

use chainread_core::{Context, Result};
use chainread_wire::messages::{
    GetLatestValueReply, GetLatestValueRequest, GetLatestValueWithHeadDataReply,
};
use chainread_wire::ReaderReply;

use super::{decode_params, encode_result};
use crate::server::Session;

/// Handle GetLatestValue.
pub(crate) fn get_latest_value(
    s: &Session<'_>,
    ctx: &Context,
    req: GetLatestValueRequest,
) -> Result<ReaderReply> {
    let params = decode_params(s, &req.read_identifier, &req.params)?;
    let ret_type = s.resolve_type(&req.read_identifier, false)?;
    let value = s
        .reader
        .get_latest_value(ctx, &req.read_identifier, req.confidence, &params)?;
    Ok(ReaderReply::GetLatestValue(GetLatestValueReply {
        ret_val: encode_result(s, &ret_type, value, req.as_value_type)?,
    }))
}

/// Handle GetLatestValueWithHeadData.
pub(crate) fn get_latest_value_with_head_data(
    s: &Session<'_>,
    ctx: &Context,
    req: GetLatestValueRequest,
) -> Result<ReaderReply> {
    let params = decode_params(s, &req.read_identifier, &req.params)?;
    let ret_type = s.resolve_type(&req.read_identifier, false)?;
    let (value, head) = s.reader.get_latest_value_with_head_data(
        ctx,
        &req.read_identifier,
        req.confidence,
        &params,
    )?;
    Ok(ReaderReply::GetLatestValueWithHeadData(
        GetLatestValueWithHeadDataReply {
            ret_val: encode_result(s, &ret_type, value, req.as_value_type)?,
            head_data: head,
        },
    ))
}
