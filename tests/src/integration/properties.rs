//! # Property Tests
//!
//! Any JSON payload sent through the engine to an echoing responder comes
//! back as the call's `data`, unchanged.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::Harness;
    use gateway_services::topics;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 _@.-]{0,16}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
            ]
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_payload_round_trips_to_data(payload in arb_json()) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let echoed = runtime.block_on(async {
                let h = Harness::new();
                let _owner = h.echo(topics::USER_BY_ID);
                let result = h
                    .engine
                    .call(payload.clone(), "request-user-by-id", "response-user-by-id", None)
                    .await;
                h.engine.shutdown().await.unwrap();
                result
            });

            prop_assert_eq!(echoed.unwrap(), payload);
        }
    }
}
