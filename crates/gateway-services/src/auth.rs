//! Principal lookup for login.
//!
//! Only the user fetch lives here. Password and second-factor checks are
//! done by the caller against the returned record.

use crate::error::{ServiceError, ServiceResult};
use crate::records::User;
use crate::users::UserService;
use tracing::warn;

/// Message shown for every credential failure, whatever the cause.
pub const CREDENTIALS_NOT_CORRECT: &str = "Credentials not correct";

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
}

impl AuthService {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }

    /// The stored user for `email`, including credential fields.
    ///
    /// An unknown email is `Unauthorized`; an unreachable user service stays
    /// `Unavailable` so it is not mistaken for bad credentials.
    pub async fn principal_for_email(&self, email: &str) -> ServiceResult<User> {
        match self.users.find_by_email(email).await {
            Err(ServiceError::NotFound { .. }) => {
                warn!("Login attempt for unknown email");
                Err(ServiceError::Unauthorized(CREDENTIALS_NOT_CORRECT.to_string()))
            }
            other => other,
        }
    }
}
