//! Session authentication over the user store

use std::time::Duration;

use super::token::{self, Credential, SessionSecret, TokenClaims};
use super::user::{self, User};
use super::AuthError;
use crate::config::{AuthConfig, ConfigError};
use crate::model::Timestamp;
use crate::storage::DeskSqlStore;

/// Verifies bearer credentials and resolves the acting user
///
/// Verification is stateless: the token carries its own claims and MAC, and
/// the only storage round trip is resolving the subject to a live account.
#[derive(Clone)]
pub struct Authenticator {
    store: DeskSqlStore,
    secret: SessionSecret,
    token_ttl: Duration,
}

impl Authenticator {
    /// Build an authenticator with the signing secret from configuration
    pub fn new(store: DeskSqlStore, auth: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Authenticator {
            store,
            secret: SessionSecret::new(auth.secret_bytes()?),
            token_ttl: auth.token_ttl,
        })
    }

    /// Register a new account
    pub fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        user::validate_email(email)?;
        user::validate_password(password)?;

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AuthError::InvalidInput(
                "Display name must not be empty".to_string(),
            ));
        }

        let email = user::normalize_email(email);
        if self.store.get_user_by_email(&email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = user::hash_password(password)?;
        let account = User::new(email, display_name.to_string(), password_hash);
        self.store.create_user(&account)?;

        tracing::info!(user = %account.id, "registered new account");
        Ok(account)
    }

    /// Verify an email/password pair and mint a session token
    ///
    /// Unknown emails, wrong passwords, and disabled accounts all fail
    /// identically.
    pub fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = user::normalize_email(email);
        let account = self
            .store
            .get_user_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if account.disabled {
            return Err(AuthError::InvalidCredentials);
        }

        user::verify_password(password, &account.password_hash)?;

        let session_token = self.mint_session(&account)?;
        tracing::info!(user = %account.id, "login succeeded");
        Ok((account, session_token))
    }

    /// Mint a fresh session token for an account
    pub fn mint_session(&self, account: &User) -> Result<String, AuthError> {
        let claims = TokenClaims::new(account.id.clone(), Timestamp::now(), self.token_ttl);
        token::mint_token(&self.secret, &claims)
    }

    /// Resolve a bearer credential to a live user
    ///
    /// A valid signature over a subject that no longer exists (or has been
    /// disabled) still fails: deletion and disablement act as revocation.
    pub fn authenticate(&self, credential: &Credential) -> Result<User, AuthError> {
        let claims = token::verify_token(&self.secret, credential.token(), Timestamp::now())?;

        let account = self
            .store
            .get_user(&claims.sub)?
            .ok_or(AuthError::Unauthenticated)?;

        if account.disabled {
            return Err(AuthError::Unauthenticated);
        }

        Ok(account)
    }

    /// Like `authenticate`, but an absent credential is not an error
    pub fn optional_authenticate(
        &self,
        credential: Option<&Credential>,
    ) -> Result<Option<User>, AuthError> {
        match credential {
            Some(credential) => self.authenticate(credential).map(Some),
            None => Ok(None),
        }
    }

    /// End a session
    ///
    /// Tokens are stateless, so this validates the credential and leaves
    /// discarding it to the client; there is no server-side session table.
    pub fn logout(&self, credential: &Credential) -> Result<(), AuthError> {
        let account = self.authenticate(credential)?;
        tracing::info!(user = %account.id, "logout");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Authenticator {
        let store = DeskSqlStore::memory().unwrap();
        let mut auth = AuthConfig::default();
        auth.token_secret = hex::encode([9u8; 32]);
        Authenticator::new(store, &auth).unwrap()
    }

    #[test]
    fn test_register_and_login() {
        let authenticator = setup();

        let account = authenticator
            .register("Alice@Example.com", "hunter2000", "Alice")
            .unwrap();
        assert_eq!(account.email, "alice@example.com");

        let (logged_in, session_token) = authenticator
            .login("alice@example.com", "hunter2000")
            .unwrap();
        assert_eq!(logged_in.id, account.id);
        assert!(!session_token.is_empty());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let authenticator = setup();

        authenticator
            .register("alice@example.com", "hunter2000", "Alice")
            .unwrap();

        let result = authenticator.register("ALICE@example.com", "other-password", "Imposter");
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[test]
    fn test_login_wrong_password_and_unknown_email_fail_identically() {
        let authenticator = setup();
        authenticator
            .register("alice@example.com", "hunter2000", "Alice")
            .unwrap();

        let wrong_password = authenticator.login("alice@example.com", "wrong-password");
        let unknown_email = authenticator.login("nobody@example.com", "hunter2000");

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_authenticate_round_trip() {
        let authenticator = setup();
        let (account, session_token) = {
            authenticator
                .register("alice@example.com", "hunter2000", "Alice")
                .unwrap();
            authenticator.login("alice@example.com", "hunter2000").unwrap()
        };

        let credential = Credential::Bearer(session_token);
        let resolved = authenticator.authenticate(&credential).unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[test]
    fn test_disabled_account_token_is_revoked() {
        let authenticator = setup();
        authenticator
            .register("alice@example.com", "hunter2000", "Alice")
            .unwrap();
        let (account, session_token) = authenticator
            .login("alice@example.com", "hunter2000")
            .unwrap();

        authenticator
            .store
            .set_user_disabled(&account.id, true)
            .unwrap();

        let credential = Credential::Cookie(session_token);
        assert!(matches!(
            authenticator.authenticate(&credential),
            Err(AuthError::Unauthenticated)
        ));

        // Disabled accounts cannot log back in either
        assert!(matches!(
            authenticator.login("alice@example.com", "hunter2000"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_optional_authenticate() {
        let authenticator = setup();

        assert!(authenticator.optional_authenticate(None).unwrap().is_none());

        let bogus = Credential::Bearer("junk".to_string());
        assert!(authenticator.optional_authenticate(Some(&bogus)).is_err());
    }

    #[test]
    fn test_logout_requires_valid_session() {
        let authenticator = setup();
        authenticator
            .register("alice@example.com", "hunter2000", "Alice")
            .unwrap();
        let (_, session_token) = authenticator
            .login("alice@example.com", "hunter2000")
            .unwrap();

        assert!(authenticator
            .logout(&Credential::Cookie(session_token))
            .is_ok());
        assert!(authenticator
            .logout(&Credential::Cookie("junk".to_string()))
            .is_err());
    }
}
