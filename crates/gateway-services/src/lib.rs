//! # Gateway Services
//!
//! Clients for the services that own users, roles and tickets. Each
//! operation builds a payload, picks its topic pair and goes through an
//! [`RpcCaller`] (normally the shared `CorrelationEngine`).
//!
//! ```text
//! UserService ─┐
//! RoleService ─┼─→ ServiceClient ─→ RpcCaller ─→ request-<op> / response-<op>
//! TicketService┘
//! AuthService ──→ UserService
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let services = Services::new(engine.clone());
//! let user = services.users.find_by_id(7).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod auth;
pub mod client;
pub mod error;
pub mod records;
pub mod roles;
pub mod tickets;
pub mod topics;
pub mod users;

pub use auth::{AuthService, CREDENTIALS_NOT_CORRECT};
pub use client::ServiceClient;
pub use error::{ServiceError, ServiceResult};
pub use gateway_rpc::RpcCaller;
pub use records::{Role, Ticket, User, UserProfile};
pub use roles::RoleService;
pub use tickets::TicketService;
pub use topics::TopicPair;
pub use users::UserService;

use std::sync::Arc;

/// Every service client over one caller.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub roles: RoleService,
    pub tickets: TicketService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(caller: Arc<dyn RpcCaller>) -> Self {
        Self::from_client(ServiceClient::new(caller))
    }

    pub fn from_client(client: ServiceClient) -> Self {
        let users = UserService::new(client.clone());
        Self {
            auth: AuthService::new(users.clone()),
            roles: RoleService::new(client.clone()),
            tickets: TicketService::new(client),
            users,
        }
    }
}
