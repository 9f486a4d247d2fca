//! Role lookups and mutations.

use crate::client::ServiceClient;
use crate::error::ServiceResult;
use crate::records::Role;
use crate::topics;
use serde_json::{json, Value};

const RESOURCE: &str = "role";

#[derive(Clone)]
pub struct RoleService {
    client: ServiceClient,
}

impl RoleService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<Role> {
        self.client
            .lookup(topics::ROLE_BY_ID, json!({ "id": id }), RESOURCE)
            .await
    }

    pub async fn find_by_user_id(&self, user_id: i64) -> ServiceResult<Vec<Role>> {
        self.client
            .list(topics::ROLES_BY_USER_ID, json!({ "id": user_id }), RESOURCE)
            .await
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<Role>> {
        self.client.list(topics::ROLES, Value::Null, RESOURCE).await
    }

    /// The payload is the bare name.
    pub async fn create(&self, name: &str) -> ServiceResult<Role> {
        self.client
            .persist(topics::CREATE_ROLE, json!(name), RESOURCE)
            .await
    }

    pub async fn update(&self, id: i64, name: &str) -> ServiceResult<Role> {
        self.client
            .lookup(topics::UPDATE_ROLE, json!({ "id": id, "name": name }), RESOURCE)
            .await
    }

    pub async fn remove_by_id(&self, id: i64) -> ServiceResult<Value> {
        self.client
            .send(topics::REMOVE_ROLE, json!({ "id": id }), RESOURCE)
            .await
    }
}
