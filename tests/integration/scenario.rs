//! Custom-ID binding lifecycle through the full stack.

use std::collections::BTreeMap;

use crate::common::*;

fn ids(pairs: &[(&str, BoundContract)]) -> BTreeMap<String, BoundContract> {
    pairs
        .iter()
        .map(|(id, b)| (id.to_string(), b.clone()))
        .collect()
}

fn balance_of(registry: &BindingRegistry, custom_id: &str) -> Result<u64> {
    registry.get_latest_value_as(
        &Context::background(),
        custom_id,
        "balanceOf",
        ConfidenceLevel::Finalized,
        &owner("alice"),
    )
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn bind_read_unbind_read() {
    let stack = TestStack::new(EncodingVersion::Cbor);
    stack.chain.credit(&usdc(), "alice", 100);
    stack.chain.credit(&weth(), "alice", 3);
    let registry = stack.registry();
    let ctx = Context::background();

    registry.bind(&ctx, &ids(&[("A", usdc())])).unwrap();
    registry.bind(&ctx, &ids(&[("B", weth())])).unwrap();
    assert_eq!(balance_of(&registry, "A").unwrap(), 100);

    registry.unbind(&ctx, &ids(&[("A", usdc())])).unwrap();
    let err = balance_of(&registry, "A").unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {:?}", err);

    assert_eq!(balance_of(&registry, "B").unwrap(), 3);
}

#[test]
fn read_before_bind_is_not_found() {
    let stack = TestStack::new(EncodingVersion::Json);
    let registry = stack.registry();
    assert!(balance_of(&registry, "A").unwrap_err().is_not_found());
}

#[test]
fn rebind_after_unbind() {
    let stack = TestStack::new(EncodingVersion::JsonStringified);
    stack.chain.credit(&usdc(), "alice", u64::MAX);
    let registry = stack.registry();
    let ctx = Context::background();

    registry.bind(&ctx, &ids(&[("A", usdc())])).unwrap();
    registry.unbind(&ctx, &ids(&[("A", usdc())])).unwrap();
    registry.bind(&ctx, &ids(&[("A", usdc())])).unwrap();
    assert_eq!(balance_of(&registry, "A").unwrap(), u64::MAX);
}

#[test]
fn unbinding_the_chain_side_is_seen_by_the_registry() {
    // The registry still maps A, but the worker no longer knows the contract
    let stack = TestStack::new(EncodingVersion::Cbor);
    let registry = stack.registry();
    let ctx = Context::background();

    registry.bind(&ctx, &ids(&[("A", usdc())])).unwrap();
    stack.client.unbind(&ctx, &[usdc()]).unwrap();
    assert!(registry.lookup("A").is_ok());
    assert!(balance_of(&registry, "A").unwrap_err().is_not_found());
}

// ============================================================================
// Batches through custom IDs
// ============================================================================

#[test]
fn custom_id_batch() {
    let stack = TestStack::new(EncodingVersion::Cbor);
    stack.chain.credit(&usdc(), "alice", 10);
    stack.chain.credit(&weth(), "bob", 20);
    let registry = stack.registry();
    let ctx = Context::background();
    registry
        .bind(&ctx, &ids(&[("A", usdc()), ("B", weth())]))
        .unwrap();

    let mut request = CustomIdBatchRequest::new();
    request.insert(
        "A".into(),
        vec![
            BatchRead::new("balanceOf", owner("alice")).returning(TypeDescriptor::Uint),
            BatchRead::new("symbol", Value::Null).returning(TypeDescriptor::String),
        ],
    );
    request.insert(
        "B".into(),
        vec![BatchRead::new("balanceOf", owner("bob")).returning(TypeDescriptor::Uint)],
    );

    let result = registry
        .batch_get_latest_values_by_custom_id(&ctx, &request)
        .unwrap();
    assert_eq!(result["A"][0].decode::<u64>().unwrap(), 10);
    assert_eq!(result["A"][1].decode::<String>().unwrap(), "USDC");
    assert_eq!(result["B"][0].decode::<u64>().unwrap(), 20);
}
