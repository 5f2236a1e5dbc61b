//! Stateless session tokens
//!
//! A token is `hex(claims).hex(mac)` where the MAC is a keyed BLAKE3 hash of
//! the claims bytes. Verification never touches storage; the authenticator
//! resolves the subject separately so deleted or disabled accounts are
//! rejected even with a valid signature.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::AuthError;
use crate::model::{Timestamp, UserId};

/// Current claims payload version
const CLAIMS_VERSION: u8 = 1;

/// Process-wide session signing secret, injected from configuration
#[derive(Clone)]
pub struct SessionSecret([u8; 32]);

impl SessionSecret {
    pub fn new(key: [u8; 32]) -> Self {
        SessionSecret(key)
    }
}

impl std::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("SessionSecret").finish_non_exhaustive()
    }
}

/// Claims carried inside a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Payload version
    pub v: u8,

    /// Subject user id
    pub sub: UserId,

    /// Issued-at, milliseconds since epoch
    pub iat: u64,

    /// Expiry, milliseconds since epoch
    pub exp: u64,
}

impl TokenClaims {
    /// Claims for a new session starting now
    pub fn new(subject: UserId, now: Timestamp, ttl: Duration) -> Self {
        TokenClaims {
            v: CLAIMS_VERSION,
            sub: subject,
            iat: now.as_millis(),
            exp: now.plus(ttl).as_millis(),
        }
    }

    /// Whether the claims have expired at `now`
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.as_millis() >= self.exp
    }
}

/// Mint a signed session token
pub fn mint_token(secret: &SessionSecret, claims: &TokenClaims) -> Result<String, AuthError> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| AuthError::InvalidInput(format!("Claims encoding failed: {}", e)))?;
    let mac = blake3::keyed_hash(&secret.0, &payload);

    Ok(format!("{}.{}", hex::encode(&payload), hex::encode(mac.as_bytes())))
}

/// Verify a session token's signature and expiry, returning its claims
pub fn verify_token(
    secret: &SessionSecret,
    token: &str,
    now: Timestamp,
) -> Result<TokenClaims, AuthError> {
    let (payload_hex, mac_hex) = token.split_once('.').ok_or(AuthError::Unauthenticated)?;

    let payload = hex::decode(payload_hex).map_err(|_| AuthError::Unauthenticated)?;
    let mac_bytes: [u8; 32] = hex::decode(mac_hex)
        .map_err(|_| AuthError::Unauthenticated)?
        .try_into()
        .map_err(|_| AuthError::Unauthenticated)?;

    // blake3::Hash equality is constant-time
    let expected = blake3::keyed_hash(&secret.0, &payload);
    if expected != blake3::Hash::from(mac_bytes) {
        return Err(AuthError::Unauthenticated);
    }

    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| AuthError::Unauthenticated)?;

    if claims.v != CLAIMS_VERSION {
        return Err(AuthError::Unauthenticated);
    }
    if claims.is_expired(now) {
        return Err(AuthError::Unauthenticated);
    }

    Ok(claims)
}

/// A bearer credential as presented by the transport collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Token carried in the session cookie
    Cookie(String),

    /// Token carried in an `Authorization: Bearer` header
    Bearer(String),
}

impl Credential {
    /// Extract a credential from transport parts; the cookie wins when both
    /// are present
    pub fn from_parts(cookie: Option<&str>, authorization: Option<&str>) -> Option<Credential> {
        if let Some(token) = cookie {
            if !token.is_empty() {
                return Some(Credential::Cookie(token.to_string()));
            }
        }

        let header = authorization?;
        let token = header.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential::Bearer(token.to_string()))
    }

    /// The raw token string
    pub fn token(&self) -> &str {
        match self {
            Credential::Cookie(token) => token,
            Credential::Bearer(token) => token,
        }
    }
}
