//! Workspace join invites
//!
//! A workspace has at most one live invite at a time; issuing a new one
//! invalidates the previous. Redemption consumes the token exactly once and
//! is idempotent for the user who consumed it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{InviteId, Timestamp, UserId, WorkspaceId};

/// A time-bounded, single-workspace join token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    /// Unique identifier
    pub id: InviteId,

    /// Target workspace
    pub workspace_id: WorkspaceId,

    /// Opaque unguessable join token
    pub token: String,

    /// Who issued the invite
    pub issuer: UserId,

    /// When the invite was issued
    pub created_at: Timestamp,

    /// When the invite stops being redeemable
    pub expires_at: Timestamp,

    /// Set once the invite has been redeemed
    pub consumed_at: Option<Timestamp>,

    /// Who redeemed the invite
    pub consumed_by: Option<UserId>,
}

impl Invite {
    /// Create a fresh invite for a workspace
    pub fn new(workspace_id: WorkspaceId, issuer: UserId, ttl: Duration) -> Self {
        let now = Timestamp::now();

        Invite {
            id: InviteId::generate(),
            workspace_id,
            token: generate_invite_token(),
            issuer,
            created_at: now,
            expires_at: now.plus(ttl),
            consumed_at: None,
            consumed_by: None,
        }
    }

    /// Whether the invite can still be redeemed at `now`
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.consumed_at.is_none() && now < self.expires_at
    }
}

/// Generate a random invite token
fn generate_invite_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 24;

    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Invite operation errors
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    /// Unknown, expired, and already-consumed tokens are deliberately
    /// indistinguishable
    #[error("Invite is invalid or has expired")]
    InvalidOrExpired,

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_invite_is_live() {
        let invite = Invite::new(
            WorkspaceId::generate(),
            UserId::generate(),
            Duration::from_secs(3600),
        );

        assert!(invite.is_live(Timestamp::now()));
        assert!(invite.consumed_at.is_none());
    }

    #[test]
    fn test_expired_invite_is_not_live() {
        let invite = Invite::new(
            WorkspaceId::generate(),
            UserId::generate(),
            Duration::from_secs(60),
        );

        let after_expiry = invite.expires_at.plus(Duration::from_millis(1));
        assert!(!invite.is_live(after_expiry));
    }

    #[test]
    fn test_consumed_invite_is_not_live() {
        let mut invite = Invite::new(
            WorkspaceId::generate(),
            UserId::generate(),
            Duration::from_secs(3600),
        );

        invite.consumed_at = Some(Timestamp::now());
        invite.consumed_by = Some(UserId::generate());
        assert!(!invite.is_live(Timestamp::now()));
    }

    #[test]
    fn test_token_format() {
        let invite = Invite::new(
            WorkspaceId::generate(),
            UserId::generate(),
            Duration::from_secs(3600),
        );

        assert_eq!(invite.token.len(), 24);
        assert!(invite.token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let t1 = generate_invite_token();
        let t2 = generate_invite_token();
        assert_ne!(t1, t2);
    }
}
