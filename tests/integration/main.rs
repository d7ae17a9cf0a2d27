//! Integration Tests
//!
//! End-to-end tests through client, loopback transport and server:
//! - Scenario: custom-ID binding lifecycle
//! - Protocol: every operation under every session encoding
//! - Properties: wire conversions and batch ordering under generated input

#[path = "../common/mod.rs"]
mod common;

mod properties;
mod protocol;
mod scenario;
