//! Workspace registry, membership, and invite operations

use std::sync::Arc;

use super::resolve_caller;
use crate::error::ApiResult;
use newsdesk_core::core_identity::{Authenticator, Credential};
use newsdesk_core::core_workspace::{
    Invite, MembershipManager, Role, Workspace, WorkspaceManager, WorkspaceMember,
    WorkspaceRegistry, WorkspaceSelector,
};
use newsdesk_core::model::UserId;

/// Workspace lifecycle and membership management
#[derive(Clone)]
pub struct WorkspaceService {
    authenticator: Arc<Authenticator>,
    registry: Arc<WorkspaceRegistry>,
}

impl WorkspaceService {
    pub fn new(authenticator: Arc<Authenticator>, registry: Arc<WorkspaceRegistry>) -> Self {
        Self {
            authenticator,
            registry,
        }
    }

    /// Create a workspace; the caller becomes its owner
    pub async fn create_workspace(
        &self,
        credential: &Credential,
        name: &str,
    ) -> ApiResult<Workspace> {
        let user = self.authenticator.authenticate(credential)?;
        Ok(self.registry.create_workspace(name, &user.id)?)
    }

    /// Workspaces the caller belongs to
    pub async fn list_workspaces(&self, credential: &Credential) -> ApiResult<Vec<Workspace>> {
        let user = self.authenticator.authenticate(credential)?;
        Ok(self.registry.list_user_workspaces(&user.id)?)
    }

    /// Resolve one workspace (membership required)
    pub async fn get_workspace(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Workspace> {
        let (_, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(resolved)
    }

    /// Delete a workspace and everything in it (owner only)
    pub async fn delete_workspace(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<()> {
        let (user, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.registry.delete_workspace(&resolved.id, &user.id)?)
    }

    /// List workspace members
    pub async fn list_members(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Vec<WorkspaceMember>> {
        let (user, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.registry.list_members(&resolved.id, &user.id)?)
    }

    /// Change a member's role
    pub async fn update_member_role(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        target: &UserId,
        new_role: Role,
    ) -> ApiResult<WorkspaceMember> {
        let (user, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .registry
            .update_member_role(&resolved.id, &user.id, target, new_role)?)
    }

    /// Remove a member (or leave, when target is the caller)
    pub async fn remove_member(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        target: &UserId,
    ) -> ApiResult<()> {
        let (user, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.registry.remove_member(&resolved.id, &user.id, target)?)
    }

    /// Issue a join invite (admin or above)
    pub async fn create_invite(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Invite> {
        let (user, resolved, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.registry.issue_invite(&resolved.id, &user.id)?)
    }

    /// Redeem an invite token; account-level, no workspace selector
    pub async fn redeem_invite(
        &self,
        credential: &Credential,
        token: &str,
    ) -> ApiResult<WorkspaceMember> {
        let user = self.authenticator.authenticate(credential)?;
        Ok(self.registry.redeem_invite(token, &user.id)?)
    }
}
