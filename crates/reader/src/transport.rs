//! The connection between client and server
//!
//! A [`Transport`] delivers one request and blocks for its reply. It is also
//! the service the client forwards lifecycle calls to. Failures come back as
//! [`WireError`]s; turning them into reader errors is the client's job.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use chainread_core::{Context, Error, Result, Service};
use chainread_wire::{ReaderReply, ReaderRequest, WireError};

use crate::server::ContractReaderServer;

/// A blocking request/reply connection to a reader server
pub trait Transport: Service {
    /// Deliver `request` and wait for its reply.
    ///
    /// Delivery is at most once; a call abandoned by the caller may still
    /// run on the remote side.
    fn call(
        &self,
        ctx: &Context,
        request: ReaderRequest,
    ) -> std::result::Result<ReaderReply, WireError>;
}

/// In-process transport that marshals every message through bincode
/// before handing it to a server.
pub struct LoopbackTransport {
    server: Arc<ContractReaderServer>,
}

impl LoopbackTransport {
    /// Connect to `server`
    pub fn new(server: Arc<ContractReaderServer>) -> Self {
        Self { server }
    }
}

fn marshal<T>(value: &T) -> std::result::Result<Vec<u8>, WireError>
where
    T: serde::Serialize,
{
    bincode::serialize(value).map_err(|e| WireError::unavailable(format!("marshal: {}", e)))
}

fn unmarshal<T>(bytes: &[u8]) -> std::result::Result<T, WireError>
where
    T: serde::de::DeserializeOwned,
{
    bincode::deserialize(bytes).map_err(|e| WireError::unavailable(format!("unmarshal: {}", e)))
}

impl Transport for LoopbackTransport {
    fn call(
        &self,
        ctx: &Context,
        request: ReaderRequest,
    ) -> std::result::Result<ReaderReply, WireError> {
        let sent = marshal(&request)?;
        trace!(target: "chainread::transport", bytes = sent.len(), "request marshaled");
        let received: ReaderRequest = unmarshal(&sent)?;

        let outcome: std::result::Result<ReaderReply, WireError> = self
            .server
            .handle(ctx, received)
            .map_err(|e| WireError::from(&e));

        let reply = marshal(&outcome)?;
        trace!(target: "chainread::transport", bytes = reply.len(), "reply marshaled");
        unmarshal::<std::result::Result<ReaderReply, WireError>>(&reply)?
    }
}

impl Service for LoopbackTransport {
    fn name(&self) -> String {
        self.server.name()
    }

    fn start(&self, ctx: &Context) -> Result<()> {
        self.server.start(ctx)
    }

    fn close(&self) -> Result<()> {
        self.server.close()
    }

    fn ready(&self) -> Result<()> {
        self.server.ready()
    }

    fn health_report(&self) -> BTreeMap<String, Option<Error>> {
        self.server.health_report()
    }
}
