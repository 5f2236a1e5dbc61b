//! Workspace membership and the role ladder

use serde::{Deserialize, Serialize};
use std::fmt;

use super::manager::MembershipError;
use crate::model::{Timestamp, UserId, WorkspaceId};

/// Workspace-level roles, declared in ascending order of privilege so the
/// derived ordering is the authorization ordering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    /// Read-only access to workspace content
    Viewer,
    /// Can work stories, pieces, the ideas inbox, and fact-checks
    Editor,
    /// Can manage members, invites, and force workflow transitions
    Admin,
    /// Full control, including workspace deletion
    Owner,
}

impl Role {
    /// Convert Role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// Parse a string into a Role
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Role::Viewer),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            "owner" => Some(Role::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single capability check used at the top of every mutating handler
pub fn require_role(role: Role, minimum: Role) -> Result<(), MembershipError> {
    if role < minimum {
        return Err(MembershipError::InsufficientRole { minimum });
    }
    Ok(())
}

/// A user's standing within one workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Member user id
    pub user_id: UserId,

    /// Role in the workspace
    pub role: Role,

    /// When the member joined
    pub joined_at: Timestamp,

    /// Who invited this member (if applicable)
    pub invited_by: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Viewer, Role::Editor, Role::Admin, Role::Owner] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("superuser"), None);
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Owner, Role::Admin).is_ok());
        assert!(require_role(Role::Admin, Role::Admin).is_ok());
        assert!(matches!(
            require_role(Role::Editor, Role::Admin),
            Err(MembershipError::InsufficientRole { minimum: Role::Admin })
        ));
        assert!(require_role(Role::Viewer, Role::Viewer).is_ok());
    }
}
