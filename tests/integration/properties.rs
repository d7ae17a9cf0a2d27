//! Generated-input properties of the wire conversions and batches.

use proptest::prelude::*;

use chainread::wire::{
    limit_and_sort_from_wire, limit_and_sort_to_wire, ExpressionCodec, WireLimit,
    WireLimitAndSort,
};

use crate::common::*;

// ============================================================================
// Strategies
// ============================================================================

fn operator() -> impl Strategy<Value = ComparisonOperator> {
    prop_oneof![
        Just(ComparisonOperator::Eq),
        Just(ComparisonOperator::Neq),
        Just(ComparisonOperator::Gt),
        Just(ComparisonOperator::Lt),
        Just(ComparisonOperator::Gte),
        Just(ComparisonOperator::Lte),
    ]
}

fn comparable() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::Uint),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z0-9]{0,12}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

fn leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (
            "[a-z]{1,8}",
            prop::collection::vec((comparable(), operator()), 1..4)
        )
            .prop_map(|(name, comparators)| comparator(name, comparators)),
        ("[0-9]{1,8}", operator()).prop_map(|(height, op)| block(height, op)),
        prop_oneof![
            Just(ConfidenceLevel::Unconfirmed),
            Just(ConfidenceLevel::Finalized)
        ]
        .prop_map(confidence),
        (any::<u64>(), operator()).prop_map(|(ts, op)| timestamp(ts, op)),
        "0x[0-9a-f]{16}".prop_map(|hash: String| tx_hash(hash)),
    ]
}

fn expression() -> impl Strategy<Value = Expression> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(|children| and(children)),
            prop::collection::vec(inner, 2..4).prop_map(|children| or(children)),
        ]
    })
}

fn cursor_direction() -> impl Strategy<Value = CursorDirection> {
    prop_oneof![
        Just(CursorDirection::Preceding),
        Just(CursorDirection::Following)
    ]
}

fn limit_and_sort() -> impl Strategy<Value = LimitAndSort> {
    let sort = prop_oneof![
        Just(SortBy::Timestamp(SortDirection::Asc)),
        Just(SortBy::Block(SortDirection::Desc)),
        Just(SortBy::Sequence(SortDirection::Asc)),
    ];
    let limit = prop_oneof![
        (0u64..1_000).prop_map(LimitAndSort::count_limit),
        ("[a-z0-9]{1,10}", cursor_direction(), 0u64..1_000).prop_map(
            |(cursor, direction, count)| LimitAndSort::cursor_limit(cursor, direction, count)
        ),
    ];
    (limit, prop::collection::vec(sort, 0..3)).prop_map(|(las, sorts)| {
        sorts.into_iter().fold(las, |las, s| las.with_sort(s))
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn key_filter_survives_the_wire(
        key in "[A-Za-z]{1,12}",
        exprs in prop::collection::vec(expression(), 0..3),
    ) {
        let filter = where_key(key, exprs).unwrap();
        let registry = PrimitiveRegistry::new();
        for encoding in [
            EncodingVersion::Json,
            EncodingVersion::JsonStringified,
            EncodingVersion::Cbor,
            EncodingVersion::Dynamic,
        ] {
            let codec = ExpressionCodec::new(encoding, &registry);
            let wire = codec.key_filter_to_wire(&filter).unwrap();
            let back = codec.key_filter_from_wire(&wire).unwrap();
            prop_assert_eq!(&back, &filter, "encoding {}", encoding);
        }
    }

    #[test]
    fn valid_limits_survive_the_wire(las in limit_and_sort()) {
        let wire = limit_and_sort_to_wire(&las).unwrap();
        prop_assert_eq!(limit_and_sort_from_wire(&wire).unwrap(), las);
    }

    #[test]
    fn cursor_and_direction_come_together(
        cursor in proptest::option::of("[a-z0-9]{1,10}"),
        direction in proptest::option::of(cursor_direction()),
        count in 0u64..100,
    ) {
        let wire = WireLimitAndSort {
            sort_by: Vec::new(),
            limit: WireLimit { cursor: cursor.clone(), direction, count },
        };
        let result = limit_and_sort_from_wire(&wire);
        match (cursor, direction) {
            (Some(_), Some(_)) | (None, None) => prop_assert!(result.is_ok()),
            _ => prop_assert!(result.unwrap_err().is_invalid_argument()),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn batch_results_match_their_reads(
        plan in prop::collection::vec(proptest::option::of(0u64..1_000_000), 1..12),
    ) {
        let stack = TestStack::new(EncodingVersion::Cbor);
        stack.client.bind(&Context::background(), &[usdc()]).unwrap();

        let mut reads = Vec::with_capacity(plan.len());
        for (i, step) in plan.iter().enumerate() {
            let holder = format!("holder-{}", i);
            match step {
                Some(amount) => {
                    stack.chain.credit(&usdc(), &holder, *amount);
                    reads.push(
                        BatchRead::new("balanceOf", owner(&holder))
                            .returning(TypeDescriptor::Uint),
                    );
                }
                None => reads.push(BatchRead::new("revert", Value::Null)),
            }
        }
        let mut request = BatchGetLatestValuesRequest::new();
        request.insert(usdc(), reads);

        let result = stack
            .client
            .batch_get_latest_values(&Context::background(), &request)
            .unwrap();
        let items = &result[&usdc()];
        prop_assert_eq!(items.len(), plan.len());
        for (item, step) in items.iter().zip(&plan) {
            match step {
                Some(amount) => {
                    prop_assert_eq!(&item.read_name, "balanceOf");
                    prop_assert_eq!(&item.result, &Ok(Value::Uint(*amount)));
                }
                None => {
                    prop_assert_eq!(&item.read_name, "revert");
                    prop_assert!(item.result.is_err());
                }
            }
        }
    }
}
