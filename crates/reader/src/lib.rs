//! # Chainread Reader
//!
//! The contract reader protocol: a host-side client and a worker-side
//! server speaking the `chainread-wire` messages, plus a custom-ID façade.
//!
//! - [`ContractReaderClient`] - a `ContractReader` that forwards over a transport
//! - [`ContractReaderServer`] - dispatches wire requests to a chain reader
//! - [`Transport`] / [`LoopbackTransport`] - the connection seam
//! - [`BindingRegistry`] - addresses contracts by caller-chosen IDs
//!
//! ## Quick Start
//!
//! ```text
//! use chainread_reader::{ContractReaderClient, ContractReaderServer, LoopbackTransport};
//!
//! let server = Arc::new(ContractReaderServer::new(Some(chain_reader), EncodingVersion::Cbor));
//! let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)));
//!
//! client.bind(&ctx, &[feed.clone()])?;
//! let price: u64 = client.get_latest_value_as(&ctx, &feed.read_identifier("price"),
//!     ConfidenceLevel::Finalized, &())?;
//! ```

#![warn(missing_docs)]

mod bindings;
mod client;
mod server;
mod transport;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

pub use bindings::{BindingRegistry, CustomIdBatchRequest, CustomIdBatchResult};
pub use client::ContractReaderClient;
pub use server::ContractReaderServer;
pub use transport::{LoopbackTransport, Transport};
