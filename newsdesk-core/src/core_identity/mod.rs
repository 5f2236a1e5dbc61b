//! User identity and session authentication
//!
//! Accounts are password-backed (argon2id) and sessions are stateless
//! signed bearer tokens: a keyed BLAKE3 MAC over a versioned claims payload.
//! The signing secret is injected from configuration at construction.

pub mod authenticator;
pub mod token;
pub mod user;

pub use authenticator::Authenticator;
pub use token::{Credential, SessionSecret, TokenClaims};
pub use user::User;

use thiserror::Error;

/// Identity and authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential missing, malformed, expired, or failing verification.
    /// Deliberately covers "user no longer exists" so callers cannot
    /// distinguish a deleted subject from a bad token.
    #[error("Authentication failed")]
    Unauthenticated,

    /// Email or password did not match a live account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration attempted with an email that is already in use
    #[error("Email is already registered")]
    EmailTaken,

    /// Malformed input (bad email shape, empty password, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing backend failure
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}
