//! User account records and password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::model::{Timestamp, UserId};

/// A registered user account
///
/// Accounts are never deleted, only soft-disabled; authored content keeps
/// referencing the id and downstream consumers render a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Login email, unique, stored lowercased
    pub email: String,

    /// Human-readable display name
    pub display_name: String,

    /// Argon2id password hash (PHC string format)
    pub password_hash: String,

    /// Free-form role hints surfaced to workspace admins when assigning roles
    pub role_hints: Vec<String>,

    /// Soft-disable flag; a disabled account no longer authenticates
    pub disabled: bool,

    /// When the account was created
    pub created_at: Timestamp,
}

impl User {
    /// Create a new account with an already-hashed password
    pub fn new(email: String, display_name: String, password_hash: String) -> Self {
        User {
            id: UserId::generate(),
            email,
            display_name,
            password_hash,
            role_hints: Vec::new(),
            disabled: false,
            created_at: Timestamp::now(),
        }
    }
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate the shape of an email address
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 {
        return Err(AuthError::InvalidInput("Invalid email length".to_string()));
    }

    // Minimal structural check: local part, single @, dotted domain
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AuthError::InvalidInput("Invalid email format".to_string()));
    }

    Ok(())
}

/// Validate a candidate password
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password with argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|e| AuthError::HashingFailed(e.to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash_password("same password").unwrap();
        let h2 = hash_password("same password").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("hunter2").is_err());
        assert!(validate_password("hunter2000").is_ok());
    }

    #[test]
    fn test_new_user_is_enabled() {
        let user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "hash".to_string(),
        );
        assert!(!user.disabled);
        assert!(user.role_hints.is_empty());
    }
}
