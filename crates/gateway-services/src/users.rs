//! User lookups and mutations.

use crate::client::{to_payload, ServiceClient};
use crate::error::{ServiceError, ServiceResult};
use crate::records::{Role, User};
use crate::topics;
use serde_json::{json, Value};
use tracing::info;

const RESOURCE: &str = "user";

#[derive(Clone)]
pub struct UserService {
    client: ServiceClient,
}

impl UserService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn find_by_id(&self, id: i64) -> ServiceResult<User> {
        self.client
            .lookup(topics::USER_BY_ID, json!({ "id": id }), RESOURCE)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<User> {
        self.client
            .lookup(topics::USER_BY_EMAIL, json!({ "email": email }), RESOURCE)
            .await
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<User>> {
        self.client.list(topics::USERS, Value::Null, RESOURCE).await
    }

    /// Store a new user. The password must already be hashed.
    pub async fn create(&self, user: &User) -> ServiceResult<User> {
        let missing = user.missing_required();
        if !missing.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "All fields must be filled (missing: {})",
                missing.join(", ")
            )));
        }

        let created: User = self
            .client
            .persist(topics::CREATE_USER, to_payload(user)?, RESOURCE)
            .await?;
        info!(user_id = ?created.id, "User created");
        Ok(created)
    }

    pub async fn update(&self, user: &User) -> ServiceResult<User> {
        self.client
            .lookup(topics::UPDATE_USER, to_payload(user)?, RESOURCE)
            .await
    }

    /// Returns the owner's acknowledgement unchanged.
    pub async fn remove_by_id(&self, id: i64) -> ServiceResult<Value> {
        self.client
            .send(topics::REMOVE_USER, json!({ "id": id }), RESOURCE)
            .await
    }

    pub async fn find_roles_by_user_id(&self, id: i64) -> ServiceResult<Vec<Role>> {
        self.client
            .list(topics::USER_ROLES_BY_USER_ID, json!({ "id": id }), "role")
            .await
    }
}
