//! Account-level operations: registration, login, session introspection

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use newsdesk_core::core_identity::{Authenticator, Credential, User};

/// A freshly established session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHandle {
    /// The signed bearer token to present on subsequent requests
    pub token: String,

    /// The authenticated account
    pub user: User,
}

/// Registration, login, and current-user resolution
#[derive(Clone)]
pub struct AccountService {
    authenticator: Arc<Authenticator>,
}

impl AccountService {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Register a new account
    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<User> {
        Ok(self.authenticator.register(email, password, name)?)
    }

    /// Exchange email/password for a session token
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<SessionHandle> {
        let (user, token) = self.authenticator.login(email, password)?;
        Ok(SessionHandle { token, user })
    }

    /// End a session (the client discards the token)
    pub async fn logout(&self, credential: &Credential) -> ApiResult<()> {
        Ok(self.authenticator.logout(credential)?)
    }

    /// Resolve the acting user for a credential
    pub async fn current_user(&self, credential: &Credential) -> ApiResult<User> {
        Ok(self.authenticator.authenticate(credential)?)
    }

    /// Like `current_user`, but an absent credential is not an error
    pub async fn current_user_optional(
        &self,
        credential: Option<&Credential>,
    ) -> ApiResult<Option<User>> {
        Ok(self.authenticator.optional_authenticate(credential)?)
    }
}
