//! GetLatestValue tests: typed and dynamic targets, head data, errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use chainread_core::{
    ConfidenceLevel, ContractReader, Context, EncodingVersion, Error, ReaderConfig, Service,
    Value,
};

use super::fake::{connect, feed, sample_head, token, FakeReader};
use crate::{ContractReaderClient, ContractReaderServer, LoopbackTransport};

#[derive(Debug, Serialize)]
struct Account {
    account: String,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Price {
    value: u64,
    decimals: u64,
}

fn bob() -> Account {
    Account {
        account: "0xb0b".into(),
    }
}

/// A typed reader with `token` and `feed` bound
fn typed_reader() -> Arc<FakeReader> {
    let reader = Arc::new(FakeReader::typed());
    reader
        .bind(&Context::background(), &[token(), feed()])
        .unwrap();
    reader
}

// =============================================================================
// Typed reads
// =============================================================================

#[test]
fn test_typed_read_every_encoding() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(1_000));

    for encoding in [
        EncodingVersion::Json,
        EncodingVersion::JsonStringified,
        EncodingVersion::Cbor,
    ] {
        let client = connect(reader.clone(), encoding);
        let balance: u64 = client
            .get_latest_value_as(
                &Context::background(),
                &token().read_identifier("balance"),
                ConfidenceLevel::Finalized,
                &bob(),
            )
            .unwrap();
        assert_eq!(balance, 1_000, "wrong balance under {}", encoding);
    }
}

#[test]
fn test_server_sees_conformed_params() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(7));
    let client = connect(reader.clone(), EncodingVersion::Cbor);

    let _: u64 = client
        .get_latest_value_as(
            &Context::background(),
            &token().read_identifier("balance"),
            ConfidenceLevel::Unconfirmed,
            &bob(),
        )
        .unwrap();

    let calls = reader.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].read_identifier, "0xa11ce-Token-balance");
    assert_eq!(calls[0].confidence, ConfidenceLevel::Unconfirmed);
    let expected: Value = [("account", "0xb0b")].into_iter().collect();
    assert_eq!(calls[0].params, expected);
}

#[test]
fn test_stringified_keeps_full_precision() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(u64::MAX));
    let client = connect(reader, EncodingVersion::JsonStringified);

    let balance: u64 = client
        .get_latest_value_as(
            &Context::background(),
            &token().read_identifier("balance"),
            ConfidenceLevel::Finalized,
            &bob(),
        )
        .unwrap();
    assert_eq!(balance, u64::MAX);
}

#[test]
fn test_boxed_target() {
    let reader = typed_reader();
    let price: Value = [("value", 2_500u64), ("decimals", 2u64)]
        .into_iter()
        .collect();
    reader.set_value("price", price);
    let client = connect(reader, EncodingVersion::Cbor);

    let boxed: Box<Price> = client
        .get_latest_value_as(
            &Context::background(),
            &feed().read_identifier("price"),
            ConfidenceLevel::Finalized,
            &(),
        )
        .unwrap();
    assert_eq!(
        *boxed,
        Price {
            value: 2_500,
            decimals: 2
        }
    );
}

#[test]
fn test_wrong_target_type_is_invalid_type() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(1));
    let client = connect(reader, EncodingVersion::Cbor);

    let result: Result<String, Error> = client.get_latest_value_as(
        &Context::background(),
        &token().read_identifier("balance"),
        ConfidenceLevel::Finalized,
        &bob(),
    );
    assert!(result.unwrap_err().is_invalid_type());
}

// =============================================================================
// Dynamic targets
// =============================================================================

#[test]
fn test_dynamic_target_keeps_bytes() {
    let reader = typed_reader();
    reader.set_value("blob", Value::Bytes(vec![1, 2, 3]));
    // JSON alone would render the bytes as a list of integers
    let client = connect(reader, EncodingVersion::Json);

    let value = client
        .get_latest_value(
            &Context::background(),
            &token().read_identifier("blob"),
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap();
    assert!(matches!(value, Value::Bytes(ref b) if b == &vec![1, 2, 3]));
}

#[test]
fn test_typed_target_uses_session_encoding() {
    let reader = typed_reader();
    reader.set_value("blob", Value::Bytes(vec![1, 2, 3]));
    let client = connect(reader, EncodingVersion::Json);

    let bytes: Vec<u8> = client
        .get_latest_value_as(
            &Context::background(),
            &token().read_identifier("blob"),
            ConfidenceLevel::Finalized,
            &(),
        )
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
}

// =============================================================================
// Head data
// =============================================================================

#[test]
fn test_head_data_present() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(5));
    let client = connect(reader, EncodingVersion::Cbor);

    let (balance, head): (u64, _) = client
        .get_latest_value_with_head_data_as(
            &Context::background(),
            &token().read_identifier("balance"),
            ConfidenceLevel::Finalized,
            &bob(),
        )
        .unwrap();
    assert_eq!(balance, 5);
    assert_eq!(head, Some(sample_head()));
}

#[test]
fn test_head_data_absent() {
    let reader = Arc::new(FakeReader::untyped());
    reader.bind(&Context::background(), &[token()]).unwrap();
    let client = connect(reader, EncodingVersion::Cbor);

    let params: Value = [("account", "0xb0b")].into_iter().collect();
    let (value, head) = client
        .get_latest_value_with_head_data(
            &Context::background(),
            &token().read_identifier("echo"),
            ConfidenceLevel::Finalized,
            &params,
        )
        .unwrap();
    assert_eq!(value, params);
    assert!(head.is_none());
}

// =============================================================================
// Untyped readers
// =============================================================================

#[test]
fn test_untyped_reader_uses_generic_map() {
    let reader = Arc::new(FakeReader::untyped());
    reader.bind(&Context::background(), &[token()]).unwrap();
    let client = connect(reader, EncodingVersion::Json);

    let params: Value = [("nested", Value::Array(vec![Value::Uint(1)]))]
        .into_iter()
        .collect();
    let echoed = client
        .get_latest_value(
            &Context::background(),
            &token().read_identifier("echo"),
            ConfidenceLevel::Finalized,
            &params,
        )
        .unwrap();
    assert_eq!(echoed, params);
}

#[test]
fn test_untyped_reader_rejects_scalar_result() {
    let reader = Arc::new(FakeReader::untyped());
    reader.bind(&Context::background(), &[token()]).unwrap();
    reader.set_value("count", Value::Uint(3));
    let client = connect(reader, EncodingVersion::Cbor);

    let err = client
        .get_latest_value(
            &Context::background(),
            &token().read_identifier("count"),
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap_err();
    assert!(err.is_invalid_type(), "got {:?}", err);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_param_field() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(1));
    let client = connect(reader.clone(), EncodingVersion::Cbor);

    let params: Value = [("wallet", "0xb0b")].into_iter().collect();
    let err = client
        .get_latest_value(
            &Context::background(),
            &token().read_identifier("balance"),
            ConfidenceLevel::Finalized,
            &params,
        )
        .unwrap_err();
    match err {
        Error::FieldNotFound { field } => assert_eq!(field, "account"),
        other => panic!("expected FieldNotFound, got {:?}", other),
    }
    assert!(reader.calls().is_empty());
}

#[test]
fn test_unbound_contract_is_not_found() {
    let reader = Arc::new(FakeReader::typed());
    reader.set_value("balance", Value::Uint(1));
    let client = connect(reader, EncodingVersion::Cbor);

    let result: Result<u64, Error> = client.get_latest_value_as(
        &Context::background(),
        &token().read_identifier("balance"),
        ConfidenceLevel::Finalized,
        &bob(),
    );
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_server_without_reader_is_unimplemented() {
    let server = Arc::new(ContractReaderServer::new(None, EncodingVersion::Cbor));
    let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)));
    let ctx = Context::background();

    let err = client
        .get_latest_value(
            &ctx,
            &token().read_identifier("balance"),
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap_err();
    assert!(err.is_unimplemented());
    assert!(client.bind(&ctx, &[token()]).unwrap_err().is_unimplemented());
    assert!(client.ready().unwrap_err().is_unimplemented());
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancelled_context_never_reaches_reader() {
    let reader = typed_reader();
    reader.set_value("balance", Value::Uint(1));
    let client = connect(reader.clone(), EncodingVersion::Cbor);

    let ctx = Context::background();
    ctx.cancel();
    let result: Result<u64, Error> = client.get_latest_value_as(
        &ctx,
        &token().read_identifier("balance"),
        ConfidenceLevel::Finalized,
        &bob(),
    );
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(reader.calls().is_empty());
}

#[test]
fn test_configured_timeout_applies() {
    let reader = typed_reader();
    let reader_dyn: Arc<dyn ContractReader> = reader.clone();
    let server = Arc::new(ContractReaderServer::new(
        Some(reader_dyn),
        EncodingVersion::Cbor,
    ));
    let config = ReaderConfig {
        call_timeout_ms: Some(0),
        ..ReaderConfig::default()
    };
    let client =
        ContractReaderClient::from_config(Arc::new(LoopbackTransport::new(server)), &config)
            .unwrap();

    let result: Result<u64, Error> = client.get_latest_value_as(
        &Context::background(),
        &token().read_identifier("balance"),
        ConfidenceLevel::Finalized,
        &bob(),
    );
    assert!(matches!(result, Err(Error::DeadlineExceeded)));
    assert!(reader.calls().is_empty());
}
