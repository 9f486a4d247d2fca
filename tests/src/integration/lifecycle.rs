//! # Connection Lifecycle
//!
//! Lazy connect on first use, a connection that outlives every call, retry
//! after transport failures, recovery from a lost session, and shutdown.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::Harness;
    use futures::future::join_all;
    use gateway_bus::{BusClient, BusError};
    use gateway_rpc::{ConnectionState, RpcError};
    use gateway_services::topics;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_engine_starts_disconnected() {
        let h = Harness::new();
        assert_eq!(h.engine.connection_state(), ConnectionState::Disconnected);
        assert_eq!(h.client.connect_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_connect_and_subscribe_once() {
        let h = Harness::new();
        let _owner = h.echo(topics::USERS);

        let calls = (0..32).map(|i| {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .call(json!(i), "request-users", "response-users", None)
                    .await
            })
        });
        for result in join_all(calls).await {
            result.unwrap().unwrap();
        }

        assert_eq!(h.client.connect_count(), 1);
        assert_eq!(h.client.subscribe_count("response-users"), 1);
        assert_eq!(h.broker.subscriptions_opened("response-users"), 1);
    }

    #[tokio::test]
    async fn test_failure_on_one_call_leaves_connection_for_others() {
        let h = Harness::new();
        let _owner = h.echo(topics::ROLES);

        h.engine
            .call(json!(1), "request-roles", "response-roles", None)
            .await
            .unwrap();

        let err = h
            .engine
            .call(
                json!(2),
                "request-tickets",
                "response-tickets",
                Some(std::time::Duration::from_millis(20)),
            )
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        assert_eq!(h.engine.connection_state(), ConnectionState::Connected);
        h.engine
            .call(json!(3), "request-roles", "response-roles", None)
            .await
            .unwrap();
        assert_eq!(h.client.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_transport_and_retried() {
        let h = Harness::new();
        let _owner = h.echo(topics::TICKETS);
        h.client.fail_next_subscribes(1);

        let err = h
            .engine
            .call(json!(null), "request-tickets", "response-tickets", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Transport(BusError::Subscribe { .. })));
        assert!(!h.engine.is_subscribed("response-tickets"));

        h.engine
            .call(json!(null), "request-tickets", "response-tickets", None)
            .await
            .unwrap();
        assert!(h.engine.is_subscribed("response-tickets"));
    }

    #[tokio::test]
    async fn test_publish_failure_then_recovery() {
        let h = Harness::new();
        let _owner = h.echo(topics::USERS);

        h.client.fail_publishes(true);
        let err = h
            .engine
            .call(json!(1), "request-users", "response-users", None)
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(h.engine.pending_count(), 0);

        h.client.fail_publishes(false);
        assert_eq!(
            h.engine
                .call(json!(2), "request-users", "response-users", None)
                .await
                .unwrap(),
            json!(2)
        );
    }

    #[tokio::test]
    async fn test_shutdown_rejects_in_flight_and_allows_restart() {
        let h = Harness::new();
        let _silent = h.black_hole(topics::USER_BY_ID);

        let waiting: Vec<_> = (0..3)
            .map(|i| {
                let engine = h.engine.clone();
                tokio::spawn(async move {
                    engine
                        .call(json!({"id": i}), "request-user-by-id", "response-user-by-id", None)
                        .await
                })
            })
            .collect();
        while h.engine.pending_count() < 3 {
            tokio::task::yield_now().await;
        }

        h.engine.shutdown().await.unwrap();
        for call in waiting {
            assert_eq!(
                call.await.unwrap().unwrap_err(),
                RpcError::Transport(BusError::Closed)
            );
        }
        assert_eq!(h.engine.connection_state(), ConnectionState::Disconnected);
        assert!(!h.client.is_connected());

        // The next call brings everything back up.
        let _owner = h.echo(topics::USERS);
        h.engine
            .call(json!(1), "request-users", "response-users", None)
            .await
            .unwrap();
        assert_eq!(h.client.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_lost_session_rejects_waiters_and_reconnects() {
        let h = Harness::new();
        let _silent = h.black_hole(topics::USER_BY_ID);
        let _owner = h.echo(topics::USERS);

        let waiting = {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .call(json!({"id": 1}), "request-user-by-id", "response-user-by-id", None)
                    .await
            })
        };
        while h.engine.pending_count() == 0 {
            tokio::task::yield_now().await;
        }

        // Drop the session behind the engine's back.
        h.client.disconnect().await.unwrap();

        let err = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("waiting call was not released")
            .unwrap()
            .unwrap_err();
        assert_eq!(err, RpcError::Transport(BusError::Closed));
        assert_eq!(h.engine.connection_state(), ConnectionState::Disconnected);
        assert!(!h.engine.is_subscribed("response-user-by-id"));

        assert_eq!(
            h.engine
                .call(json!("again"), "request-users", "response-users", None)
                .await
                .unwrap(),
            json!("again")
        );
        assert_eq!(h.client.connect_count(), 2);
        assert_eq!(h.engine.connection_state(), ConnectionState::Connected);
    }
}
