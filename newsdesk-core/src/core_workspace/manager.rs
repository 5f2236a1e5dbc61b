//! Manager traits for workspace and membership operations

use super::invite::{Invite, InviteError};
use super::member::{Role, WorkspaceMember};
use super::workspace::{Workspace, WorkspaceError, WorkspaceSelector};
use crate::model::{UserId, WorkspaceId};

/// Manager for workspace registry operations
pub trait WorkspaceManager {
    /// Create a new workspace; the creator becomes its first owner
    fn create_workspace(&self, name: &str, owner: &UserId) -> Result<Workspace, WorkspaceError>;

    /// Look up a workspace by id or slug
    fn get_workspace(&self, selector: &WorkspaceSelector) -> Result<Workspace, WorkspaceError>;

    /// List workspaces a user is a member of
    fn list_user_workspaces(&self, user_id: &UserId) -> Result<Vec<Workspace>, WorkspaceError>;

    /// Delete a workspace and everything scoped to it (owner only)
    fn delete_workspace(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<(), MembershipError>;
}

/// Manager for membership and invite operations
pub trait MembershipManager {
    /// Resolve the acting user's (workspace, role) pair; required at the top
    /// of every workspace-scoped operation
    fn resolve_workspace(
        &self,
        selector: &WorkspaceSelector,
        user_id: &UserId,
    ) -> Result<(Workspace, Role), MembershipError>;

    /// List all members of a workspace (any member may look)
    fn list_members(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<Vec<WorkspaceMember>, MembershipError>;

    /// Change a member's role (admin only; owner involvement requires owner)
    fn update_member_role(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
        target: &UserId,
        new_role: Role,
    ) -> Result<WorkspaceMember, MembershipError>;

    /// Remove a member (admin only, or a member removing themself)
    fn remove_member(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
        target: &UserId,
    ) -> Result<(), MembershipError>;

    /// Issue a join invite, invalidating any previous live invite
    fn issue_invite(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<Invite, MembershipError>;

    /// Redeem an invite token into a viewer membership
    fn redeem_invite(&self, token: &str, user_id: &UserId)
        -> Result<WorkspaceMember, MembershipError>;
}

/// Membership operation errors
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Workspace not found")]
    WorkspaceNotFound,

    #[error("Not a member of this workspace")]
    NotAMember,

    #[error("Requires {minimum} role or above")]
    InsufficientRole { minimum: Role },

    #[error("Member not found in workspace")]
    MemberNotFound,

    #[error("A workspace must retain at least one owner")]
    LastOwner,

    #[error("Invite error: {0}")]
    Invite(#[from] InviteError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}
