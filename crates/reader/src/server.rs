//! The reader server - wire entry point to a chain implementation.
//!
//! The server is a stateless dispatcher: it decodes a request, routes it to
//! the matching handler, and encodes the reply. All read state lives in the
//! wrapped [`ContractReader`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use chainread_core::{
    ContractReader, Context, EncodingVersion, Error, ReaderConfig, Result, Service,
    TypeDescriptor,
};
use chainread_wire::{ExpressionCodec, PrimitiveRegistry, ReaderReply, ReaderRequest};

use crate::handlers;

/// Wire-facing wrapper around a chain reader.
///
/// A server built without a reader answers every operation with
/// `Unimplemented`, so callers can tell "not supported" from "failed".
///
/// # Thread Safety
///
/// `ContractReaderServer` is `Send + Sync` and can be shared across threads.
pub struct ContractReaderServer {
    reader: Option<Arc<dyn ContractReader>>,
    encoding: EncodingVersion,
    registry: Arc<PrimitiveRegistry>,
    service_name: String,
}

impl ContractReaderServer {
    /// Serve `reader`, encoding replies with `encoding` by default.
    pub fn new(reader: Option<Arc<dyn ContractReader>>, encoding: EncodingVersion) -> Self {
        Self {
            reader,
            encoding,
            registry: Arc::new(PrimitiveRegistry::new()),
            service_name: ReaderConfig::default().service_name,
        }
    }

    /// Serve `reader` with settings from `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configured encoding is unknown.
    pub fn from_config(
        reader: Option<Arc<dyn ContractReader>>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        let mut server = Self::new(reader, config.encoding()?);
        server.service_name = config.service_name.clone();
        Ok(server)
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

    /// Handle one request.
    ///
    /// Returns the reply or an error.
    pub fn handle(&self, ctx: &Context, request: ReaderRequest) -> Result<ReaderReply> {
        let operation = request.operation();
        let reader = self.reader.as_deref().ok_or_else(|| {
            debug!(target: "chainread::server", operation, "no reader wired");
            Error::unimplemented(operation)
        })?;
        ctx.check()?;
        debug!(target: "chainread::server", operation, "handling request");

        let session = Session {
            reader,
            encoding: self.encoding,
            registry: &self.registry,
        };

        let result = match request {
            ReaderRequest::Bind(req) => handlers::bind::bind(&session, ctx, req),
            ReaderRequest::Unbind(req) => handlers::bind::unbind(&session, ctx, req),
            ReaderRequest::GetLatestValue(req) => {
                handlers::read::get_latest_value(&session, ctx, req)
            }
            ReaderRequest::GetLatestValueWithHeadData(req) => {
                handlers::read::get_latest_value_with_head_data(&session, ctx, req)
            }
            ReaderRequest::BatchGetLatestValues(req) => {
                handlers::batch::batch_get_latest_values(&session, ctx, req)
            }
            ReaderRequest::QueryKey(req) => handlers::query::query_key(&session, ctx, req),
            ReaderRequest::QueryKeys(req) => handlers::query::query_keys(&session, ctx, req),
        };

        if let Err(e) = &result {
            debug!(target: "chainread::server", operation, error = %e, "request failed");
        }
        result
    }
}

impl Service for ContractReaderServer {
    fn name(&self) -> String {
        match &self.reader {
            Some(reader) => reader.name(),
            None => self.service_name.clone(),
        }
    }

    fn start(&self, ctx: &Context) -> Result<()> {
        match &self.reader {
            Some(reader) => reader.start(ctx),
            None => Ok(()),
        }
    }

    fn close(&self) -> Result<()> {
        match &self.reader {
            Some(reader) => reader.close(),
            None => Ok(()),
        }
    }

    fn ready(&self) -> Result<()> {
        match &self.reader {
            Some(reader) => reader.ready(),
            None => Err(Error::unimplemented("ContractReader")),
        }
    }

    fn health_report(&self) -> BTreeMap<String, Option<Error>> {
        match &self.reader {
            Some(reader) => reader.health_report(),
            None => {
                let mut report = BTreeMap::new();
                report.insert(self.name(), self.ready().err());
                report
            }
        }
    }
}

/// Per-request view handed to handlers
pub(crate) struct Session<'a> {
    pub(crate) reader: &'a dyn ContractReader,
    pub(crate) encoding: EncodingVersion,
    pub(crate) registry: &'a PrimitiveRegistry,
}

impl Session<'_> {
    /// Payload shape for a read, falling back to a generic map when the
    /// reader supplies no types.
    pub(crate) fn resolve_type(
        &self,
        read_identifier: &str,
        for_encoding: bool,
    ) -> Result<TypeDescriptor> {
        match self.reader.type_provider() {
            Some(provider) => provider.create_contract_type(read_identifier, for_encoding),
            None => {
                warn!(
                    target: "chainread::server",
                    read_identifier,
                    for_encoding,
                    "reader supplies no types, using a generic map"
                );
                Ok(TypeDescriptor::generic_map())
            }
        }
    }

    /// Encoding for a reply payload
    pub(crate) fn reply_encoding(&self, as_value_type: bool) -> EncodingVersion {
        if as_value_type {
            EncodingVersion::Dynamic
        } else {
            self.encoding
        }
    }

    pub(crate) fn expressions(&self) -> ExpressionCodec<'_> {
        ExpressionCodec::new(self.encoding, self.registry)
    }
}
