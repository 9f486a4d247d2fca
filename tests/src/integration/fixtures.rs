//! # Test Fixtures
//!
//! A broker, one in-memory client and the engine over it, plus fake data
//! owners that answer the user/role/ticket topics from shared state.

#![cfg(test)]

use gateway_bus::{BusMessage, InMemoryBroker, InMemoryBusClient, Responder};
use gateway_rpc::{CorrelationEngine, RpcConfig};
use gateway_services::topics::{self, TopicPair};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct Harness {
    pub broker: Arc<InMemoryBroker>,
    pub client: Arc<InMemoryBusClient>,
    pub engine: Arc<CorrelationEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RpcConfig::default())
    }

    pub fn with_config(config: RpcConfig) -> Self {
        gateway_telemetry::try_init_for_tests();

        let broker = Arc::new(InMemoryBroker::new());
        let client = Arc::new(InMemoryBusClient::new(broker.clone()));
        let engine = Arc::new(CorrelationEngine::new(client.clone(), config).expect("valid config"));
        Self {
            broker,
            client,
            engine,
        }
    }

    /// Reply `{data: <request data>, error: null}` on `pair`.
    pub fn echo(&self, pair: TopicPair) -> Responder {
        Responder::spawn_json(self.broker.clone(), pair.request, pair.response, |request| {
            Some(json!({"data": request["data"], "error": null}))
        })
    }

    /// Reply with a fixed body on `pair`.
    pub fn reply_with(&self, pair: TopicPair, body: Value) -> Responder {
        Responder::spawn_json(self.broker.clone(), pair.request, pair.response, move |_| {
            Some(body.clone())
        })
    }

    /// Consume `pair.request` without ever answering.
    pub fn black_hole(&self, pair: TopicPair) -> Responder {
        Responder::spawn_json(self.broker.clone(), pair.request, pair.response, |_| None)
    }

    /// Publish a raw response on `topic`.
    pub fn respond(&self, topic: &str, correlation_id: &str, body: Value) -> usize {
        self.broker.publish(BusMessage::new(
            topic,
            bytes::Bytes::from(body.to_string()),
            gateway_bus::Headers::new().with("correlationId", correlation_id),
        ))
    }
}

pub fn ok(data: Value) -> Value {
    json!({"data": data, "error": null})
}

pub fn failure(kind: &str, message: &str) -> Value {
    json!({"data": null, "error": {"kind": kind, "message": message}})
}

/// Fake owner of users, roles and tickets.
pub struct Directory {
    pub users: Arc<Mutex<Vec<Value>>>,
    pub roles: Arc<Mutex<Vec<Value>>>,
    pub tickets: Arc<Mutex<Vec<Value>>>,
    responders: Vec<Responder>,
}

impl Directory {
    pub fn spawn(broker: &Arc<InMemoryBroker>) -> Self {
        let users = Arc::new(Mutex::new(vec![json!({
            "id": 1,
            "email": "admin@example.com",
            "password": "hashedPassword",
            "firstName": "Ada",
            "lastName": "Admin",
            "roles": [1],
            "secret": "twoFaSecret"
        })]));
        let roles = Arc::new(Mutex::new(vec![json!({"id": 1, "name": "admin"})]));
        let tickets = Arc::new(Mutex::new(Vec::new()));

        let mut responders = Vec::new();
        let mut serve = |pair: TopicPair, handler: Box<dyn Fn(&Value) -> Value + Send + Sync>| {
            responders.push(Responder::spawn_json(
                broker.clone(),
                pair.request,
                pair.response,
                move |request| Some(handler(&request["data"])),
            ));
        };

        let store = users.clone();
        serve(
            topics::USER_BY_ID,
            Box::new(move |data| match find(&store.lock(), "id", &data["id"]) {
                Some(user) => ok(user),
                None => failure("NotFound", "User not found"),
            }),
        );
        let store = users.clone();
        serve(
            topics::USER_BY_EMAIL,
            Box::new(move |data| ok(find(&store.lock(), "email", &data["email"]).unwrap_or(Value::Null))),
        );
        let store = users.clone();
        serve(topics::USERS, Box::new(move |_| ok(Value::Array(store.lock().clone()))));
        let store = users.clone();
        serve(topics::CREATE_USER, Box::new(move |data| ok(insert(&store, data))));

        let store = roles.clone();
        serve(topics::ROLES, Box::new(move |_| ok(Value::Array(store.lock().clone()))));
        let store = roles.clone();
        serve(
            topics::CREATE_ROLE,
            Box::new(move |data| ok(insert(&store, &json!({"name": data})))),
        );

        let store = tickets.clone();
        serve(topics::CREATE_TICKET, Box::new(move |data| ok(insert(&store, data))));
        let store = tickets.clone();
        serve(
            topics::TICKETS_BY_USER_ID,
            Box::new(move |data| {
                let mine: Vec<Value> = store
                    .lock()
                    .iter()
                    .filter(|t| t["user"] == data["id"])
                    .cloned()
                    .collect();
                ok(Value::Array(mine))
            }),
        );

        Self {
            users,
            roles,
            tickets,
            responders,
        }
    }

    pub fn requests_handled(&self) -> u64 {
        self.responders.iter().map(Responder::handled).sum()
    }
}

fn find(records: &[Value], field: &str, needle: &Value) -> Option<Value> {
    records.iter().find(|r| &r[field] == needle).cloned()
}

fn insert(store: &Mutex<Vec<Value>>, record: &Value) -> Value {
    let mut records = store.lock();
    let mut stored = record.clone();
    stored["id"] = json!(records.len() as i64 + 1);
    records.push(stored.clone());
    stored
}
