//! Bind and Unbind handlers.

use tracing::info;

use chainread_core::{Context, Result};
use chainread_wire::messages::BindRequest;
use chainread_wire::ReaderReply;

use crate::server::Session;

/// Handle Bind.
pub(crate) fn bind(s: &Session<'_>, ctx: &Context, req: BindRequest) -> Result<ReaderReply> {
    s.reader.bind(ctx, &req.bindings)?;
    info!(target: "chainread::server", count = req.bindings.len(), "bound contracts");
    Ok(ReaderReply::Bind)
}

/// Handle Unbind.
pub(crate) fn unbind(s: &Session<'_>, ctx: &Context, req: BindRequest) -> Result<ReaderReply> {
    s.reader.unbind(ctx, &req.bindings)?;
    info!(target: "chainread::server", count = req.bindings.len(), "unbound contracts");
    Ok(ReaderReply::Unbind)
}
