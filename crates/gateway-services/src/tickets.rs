//! Ticket lookups and mutations.

use crate::client::{to_payload, ServiceClient};
use crate::error::ServiceResult;
use crate::records::Ticket;
use crate::topics;
use serde_json::{json, Value};

const RESOURCE: &str = "ticket";

#[derive(Clone)]
pub struct TicketService {
    client: ServiceClient,
}

impl TicketService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<Ticket> {
        self.client
            .lookup(topics::TICKET_BY_ID, json!({ "id": id }), RESOURCE)
            .await
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> ServiceResult<Vec<Ticket>> {
        self.client
            .list(topics::TICKETS_BY_USER_ID, json!({ "id": user_id }), RESOURCE)
            .await
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<Ticket>> {
        self.client.list(topics::TICKETS, Value::Null, RESOURCE).await
    }

    pub async fn create(&self, ticket: &Ticket) -> ServiceResult<Ticket> {
        self.client
            .persist(topics::CREATE_TICKET, to_payload(ticket)?, RESOURCE)
            .await
    }

    pub async fn update(&self, ticket: &Ticket) -> ServiceResult<Ticket> {
        self.client
            .lookup(topics::UPDATE_TICKET, to_payload(ticket)?, RESOURCE)
            .await
    }

    pub async fn remove_by_id(&self, id: i64) -> ServiceResult<Value> {
        self.client
            .send(topics::REMOVE_TICKET, json!({ "id": id }), RESOURCE)
            .await
    }
}
