//! Every protocol operation under every session encoding.

use std::sync::Arc;

use crate::common::*;

const SESSION_ENCODINGS: [EncodingVersion; 4] = [
    EncodingVersion::Json,
    EncodingVersion::JsonStringified,
    EncodingVersion::Cbor,
    EncodingVersion::Dynamic,
];

fn bound_stack(encoding: EncodingVersion) -> TestStack {
    let stack = TestStack::new(encoding);
    stack
        .client
        .bind(&Context::background(), &[usdc(), weth()])
        .unwrap();
    stack
}

fn transfers_filter() -> KeyFilter {
    where_key(
        "Transfer",
        [or([
            comparator("value", [(Value::Uint(1), ComparisonOperator::Gte)]),
            block("0", ComparisonOperator::Gt),
        ])],
    )
    .unwrap()
}

// ============================================================================
// GetLatestValue
// ============================================================================

#[test]
fn typed_reads_under_every_encoding() {
    for encoding in SESSION_ENCODINGS {
        let stack = bound_stack(encoding);
        stack.chain.credit(&usdc(), "alice", 1_234_567);

        let balance: u64 = stack
            .client
            .get_latest_value_as(
                &Context::background(),
                &usdc().read_identifier("balanceOf"),
                ConfidenceLevel::Finalized,
                &owner("alice"),
            )
            .unwrap();
        assert_eq!(balance, 1_234_567, "under {}", encoding);

        let symbol = stack
            .client
            .get_latest_value(
                &Context::background(),
                &weth().read_identifier("symbol"),
                ConfidenceLevel::Unconfirmed,
                &Value::Null,
            )
            .unwrap();
        assert_eq!(symbol, Value::String("WETH".into()), "under {}", encoding);
    }
}

#[test]
fn head_data_travels_with_the_value() {
    let stack = bound_stack(EncodingVersion::Cbor);
    stack.chain.credit(&usdc(), "alice", 5);

    let (balance, head): (u64, Option<Head>) = stack
        .client
        .get_latest_value_with_head_data_as(
            &Context::background(),
            &usdc().read_identifier("balanceOf"),
            ConfidenceLevel::Finalized,
            &owner("alice"),
        )
        .unwrap();
    assert_eq!(balance, 5);
    let head = head.unwrap();
    assert_eq!(head.height, "100");
    assert_eq!(head.hash, vec![0xab; 4]);
}

#[test]
fn chain_errors_keep_their_kind() {
    let stack = bound_stack(EncodingVersion::Json);
    let err = stack
        .client
        .get_latest_value(
            &Context::background(),
            &usdc().read_identifier("revert"),
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap_err();
    match err {
        Error::InvalidArgument { reason } => assert_eq!(reason, "execution reverted"),
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}

#[test]
fn malformed_read_identifier() {
    let stack = bound_stack(EncodingVersion::Cbor);
    let err = stack
        .client
        .get_latest_value(
            &Context::background(),
            "no-method",
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap_err();
    assert!(err.is_invalid_argument() || err.is_not_found(), "got {:?}", err);
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn batch_mixes_values_and_errors() {
    for encoding in SESSION_ENCODINGS {
        let stack = bound_stack(encoding);
        stack.chain.credit(&usdc(), "alice", 1);
        stack.chain.credit(&usdc(), "bob", 2);

        let mut request = BatchGetLatestValuesRequest::new();
        request.insert(
            usdc(),
            vec![
                BatchRead::new("balanceOf", owner("alice")).returning(TypeDescriptor::Uint),
                BatchRead::new("revert", Value::Null),
                BatchRead::new("balanceOf", owner("bob")).returning(TypeDescriptor::Uint),
                BatchRead::new("symbol", Value::Null),
            ],
        );

        let result = stack
            .client
            .batch_get_latest_values(&Context::background(), &request)
            .unwrap();
        let items = &result[&usdc()];
        assert_eq!(items.len(), 4, "under {}", encoding);
        assert_eq!(items[0].result, Ok(Value::Uint(1)), "under {}", encoding);
        assert!(items[1].result.is_err(), "under {}", encoding);
        assert_eq!(items[2].result, Ok(Value::Uint(2)), "under {}", encoding);
        assert_eq!(
            items[3].result,
            Ok(Value::String("USDC".into())),
            "under {}",
            encoding
        );
    }
}

// ============================================================================
// Key queries
// ============================================================================

#[test]
fn query_key_sorted_and_limited() {
    let stack = bound_stack(EncodingVersion::Cbor);
    stack.chain.transfer(&usdc(), "alice", 10);
    stack.chain.transfer(&usdc(), "bob", 20);
    stack.chain.transfer(&usdc(), "carol", 30);

    let las = LimitAndSort::count_limit(2).with_sort(SortBy::Sequence(SortDirection::Desc));

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Transfer {
        to: String,
        value: u64,
    }

    let sequences = stack
        .client
        .query_key_as::<Transfer>(&Context::background(), &usdc(), &transfers_filter(), &las)
        .unwrap();
    let recipients: Vec<&str> = sequences.iter().map(|s| s.data.to.as_str()).collect();
    assert_eq!(recipients, vec!["carol", "bob"]);
    assert_eq!(sequences[0].cursor, "2");
    assert_eq!(sequences[0].head.height, "3");
}

#[test]
fn query_keys_across_contracts() {
    for encoding in SESSION_ENCODINGS {
        let stack = bound_stack(encoding);
        stack.chain.transfer(&usdc(), "alice", 10);
        stack.chain.transfer(&weth(), "bob", 20);

        let transfer_type = TypeDescriptor::structure([
            ("to", TypeDescriptor::String),
            ("value", TypeDescriptor::Uint),
        ]);
        let filters = vec![
            ContractKeyFilter {
                contract: usdc(),
                filter: transfers_filter(),
                sequence_type: transfer_type.clone(),
            },
            ContractKeyFilter {
                contract: weth(),
                filter: transfers_filter(),
                sequence_type: transfer_type,
            },
        ];

        let keyed = stack
            .client
            .query_keys(&Context::background(), &filters, &LimitAndSort::default())
            .unwrap();
        assert_eq!(keyed.len(), 2, "under {}", encoding);
        assert!(keyed.iter().all(|k| k.key == "Transfer"));
        assert_eq!(
            keyed[1].sequence.data.get("value"),
            Some(&Value::Uint(20)),
            "under {}",
            encoding
        );
    }
}

#[test]
fn extension_primitives_need_translators_on_both_sides() {
    init_tracing();
    let topic = || CodecTranslator::new("evm-topic", TypeDescriptor::Bytes);
    let registry = Arc::new(
        PrimitiveRegistry::new()
            .with(Arc::new(topic()))
            .unwrap(),
    );

    let chain = MemoryChain::new();
    chain.transfer(&usdc(), "alice", 1);
    let reader: Arc<dyn ContractReader> = chain.clone();
    let filter = where_key(
        "Transfer",
        [extension("evm-topic", Value::Bytes(vec![0xdd, 0xf2]))],
    )
    .unwrap();

    // Translator on both sides
    let server = Arc::new(
        ContractReaderServer::new(Some(reader.clone()), EncodingVersion::Cbor)
            .with_registry(registry.clone()),
    );
    let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)))
        .with_registry(registry.clone());
    client.bind(&Context::background(), &[usdc()]).unwrap();
    let sequences = client
        .query_key(
            &Context::background(),
            &usdc(),
            &filter,
            &LimitAndSort::default(),
            &TypeDescriptor::Any,
        )
        .unwrap();
    assert_eq!(sequences.len(), 1);

    // Server without the translator
    let server = Arc::new(ContractReaderServer::new(Some(reader), EncodingVersion::Cbor));
    let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)))
        .with_registry(registry);
    let err = client
        .query_key(
            &Context::background(),
            &usdc(),
            &filter,
            &LimitAndSort::default(),
            &TypeDescriptor::Any,
        )
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

// ============================================================================
// Configuration and lifecycle
// ============================================================================

#[test]
fn stack_from_config() {
    init_tracing();
    let config = ReaderConfig::from_toml_str(
        r#"
encoding = "json-stringified"
call_timeout_ms = 30000
service_name = "usdc-reader"
"#,
    )
    .unwrap();

    let chain = MemoryChain::new();
    chain.credit(&usdc(), "alice", 9);
    let reader: Arc<dyn ContractReader> = chain;
    let server = Arc::new(ContractReaderServer::from_config(Some(reader), &config).unwrap());
    assert_eq!(server.encoding(), EncodingVersion::JsonStringified);

    let client =
        ContractReaderClient::from_config(Arc::new(LoopbackTransport::new(server)), &config)
            .unwrap();
    assert_eq!(client.encoding(), EncodingVersion::JsonStringified);

    client.bind(&Context::background(), &[usdc()]).unwrap();
    let balance: u64 = client
        .get_latest_value_as(
            &Context::background(),
            &usdc().read_identifier("balanceOf"),
            ConfidenceLevel::Finalized,
            &owner("alice"),
        )
        .unwrap();
    assert_eq!(balance, 9);
}

#[test]
fn readerless_server_reports_its_service_name() {
    let config = ReaderConfig {
        service_name: "evm-reader".into(),
        ..ReaderConfig::default()
    };
    let server = Arc::new(ContractReaderServer::from_config(None, &config).unwrap());
    let client = ContractReaderClient::new(Arc::new(LoopbackTransport::new(server)));

    let report = client.health_report();
    assert!(report["evm-reader"]
        .as_ref()
        .map_or(false, |e| e.is_unimplemented()));
}

#[test]
fn health_passes_through_to_the_chain() {
    let stack = TestStack::new(EncodingVersion::Cbor);
    stack.client.start(&Context::background()).unwrap();
    stack.client.ready().unwrap();
    let report = stack.client.health_report();
    assert_eq!(report.get("MemoryChain"), Some(&None));
    stack.client.close().unwrap();
}

#[test]
fn cancelled_context() {
    let stack = bound_stack(EncodingVersion::Cbor);
    let ctx = Context::background();
    let child = ctx.clone();
    ctx.cancel();
    let err = stack
        .client
        .get_latest_value(
            &child,
            &usdc().read_identifier("symbol"),
            ConfidenceLevel::Finalized,
            &Value::Null,
        )
        .unwrap_err();
    assert_eq!(err, Error::Cancelled);
}
