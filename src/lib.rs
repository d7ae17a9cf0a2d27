//! Chainread - out-of-process contract reads for pluggable blockchain backends
//!
//! A host process reads contract state from a chain-specific worker through
//! a small request/reply protocol. Payloads travel as self-describing
//! versioned envelopes, and event queries carry a serializable filter tree.
//!
//! # Quick Start
//!
//! ```ignore
//! use chainread::{BindingRegistry, ContractReaderClient, ContractReaderServer, LoopbackTransport};
//!
//! let server = Arc::new(ContractReaderServer::new(Some(chain_reader), EncodingVersion::Cbor));
//! let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)));
//! let registry = BindingRegistry::new(Arc::new(client));
//!
//! registry.bind(&ctx, &[("usdc".to_string(), usdc_contract)].into())?;
//! let supply: u64 = registry.get_latest_value_as(&ctx, "usdc", "totalSupply",
//!     ConfidenceLevel::Finalized, &Value::Null)?;
//! ```
//!
//! # Architecture
//!
//! - `chainread-core`: value model, codec, type descriptors, query expressions, traits
//! - `chainread-wire`: protocol messages and wire conversions
//! - `chainread-reader`: client, server, transports and the binding registry

pub use chainread_core::*;
pub use chainread_reader::*;
pub use chainread_wire as wire;
pub use chainread_wire::{CodecTranslator, PrimitiveRegistry, PrimitiveTranslator};
