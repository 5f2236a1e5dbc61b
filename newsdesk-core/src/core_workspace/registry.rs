//! Registry implementation over the SQL store

use std::time::Duration;

use super::invite::{Invite, InviteError};
use super::manager::{MembershipError, MembershipManager, WorkspaceManager};
use super::member::{require_role, Role, WorkspaceMember};
use super::workspace::{self, Workspace, WorkspaceError, WorkspaceSelector};
use crate::model::{Timestamp, UserId, WorkspaceId};
use crate::storage::{DeskSqlStore, MemberWriteOutcome, RedeemOutcome};

/// How many slug candidates to try before giving up on a name
const SLUG_ATTEMPTS: usize = 5;

/// Workspace registry and membership authorizer
#[derive(Clone)]
pub struct WorkspaceRegistry {
    store: DeskSqlStore,
    invite_ttl: Duration,
}

impl WorkspaceRegistry {
    /// Create a new registry with storage
    pub fn new(store: DeskSqlStore, invite_ttl: Duration) -> Self {
        Self { store, invite_ttl }
    }

    /// Look up the acting user's membership or fail with `NotAMember`
    fn member_of(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<WorkspaceMember, MembershipError> {
        self.store
            .get_member(workspace_id, user_id)?
            .ok_or(MembershipError::NotAMember)
    }
}

impl WorkspaceManager for WorkspaceRegistry {
    fn create_workspace(&self, name: &str, owner: &UserId) -> Result<Workspace, WorkspaceError> {
        workspace::validate_workspace_name(name)?;

        let mut ws = Workspace::new(name.trim().to_string());

        // Slugs are unique; retry with random suffixes on collision
        let mut attempts = 0;
        while self.store.get_workspace_by_slug(&ws.slug)?.is_some() {
            attempts += 1;
            if attempts >= SLUG_ATTEMPTS {
                return Err(WorkspaceError::SlugExhausted);
            }
            ws.slug = workspace::slug_with_suffix(&workspace::slugify(name));
        }

        let founder = WorkspaceMember {
            workspace_id: ws.id.clone(),
            user_id: owner.clone(),
            role: Role::Owner,
            joined_at: ws.created_at,
            invited_by: None,
        };

        self.store.create_workspace(&ws, &founder)?;

        tracing::info!(workspace = %ws.id, slug = %ws.slug, "created workspace");
        Ok(ws)
    }

    fn get_workspace(&self, selector: &WorkspaceSelector) -> Result<Workspace, WorkspaceError> {
        let found = match selector {
            WorkspaceSelector::Id(id) => self.store.get_workspace(id)?,
            WorkspaceSelector::Slug(slug) => self.store.get_workspace_by_slug(slug)?,
        };

        found.ok_or(WorkspaceError::NotFound)
    }

    fn list_user_workspaces(&self, user_id: &UserId) -> Result<Vec<Workspace>, WorkspaceError> {
        Ok(self.store.list_user_workspaces(user_id)?)
    }

    fn delete_workspace(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<(), MembershipError> {
        let member = self.member_of(workspace_id, acting)?;
        require_role(member.role, Role::Owner)?;

        if !self.store.delete_workspace(workspace_id)? {
            return Err(MembershipError::WorkspaceNotFound);
        }

        tracing::info!(workspace = %workspace_id, "deleted workspace");
        Ok(())
    }
}

impl MembershipManager for WorkspaceRegistry {
    fn resolve_workspace(
        &self,
        selector: &WorkspaceSelector,
        user_id: &UserId,
    ) -> Result<(Workspace, Role), MembershipError> {
        let ws = match self.get_workspace(selector) {
            Ok(ws) => ws,
            Err(WorkspaceError::NotFound) => return Err(MembershipError::WorkspaceNotFound),
            Err(e) => return Err(e.into()),
        };

        let member = self.member_of(&ws.id, user_id)?;
        Ok((ws, member.role))
    }

    fn list_members(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<Vec<WorkspaceMember>, MembershipError> {
        self.member_of(workspace_id, acting)?;
        Ok(self.store.list_members(workspace_id)?)
    }

    fn update_member_role(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
        target: &UserId,
        new_role: Role,
    ) -> Result<WorkspaceMember, MembershipError> {
        let actor = self.member_of(workspace_id, acting)?;
        require_role(actor.role, Role::Admin)?;

        // Granting or revoking ownership is itself an owner-level action
        let current = self
            .store
            .get_member(workspace_id, target)?
            .ok_or(MembershipError::MemberNotFound)?;
        if new_role == Role::Owner || current.role == Role::Owner {
            require_role(actor.role, Role::Owner)?;
        }

        match self
            .store
            .update_member_role_guarded(workspace_id, target, new_role)?
        {
            MemberWriteOutcome::Applied => {}
            MemberWriteOutcome::MemberNotFound => return Err(MembershipError::MemberNotFound),
            MemberWriteOutcome::WouldOrphanWorkspace => return Err(MembershipError::LastOwner),
        }

        tracing::info!(
            workspace = %workspace_id,
            target = %target,
            role = %new_role,
            "updated member role"
        );

        self.store
            .get_member(workspace_id, target)?
            .ok_or(MembershipError::MemberNotFound)
    }

    fn remove_member(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
        target: &UserId,
    ) -> Result<(), MembershipError> {
        let actor = self.member_of(workspace_id, acting)?;

        // Members may leave on their own; removing anyone else is admin-level
        if acting != target {
            require_role(actor.role, Role::Admin)?;

            let current = self
                .store
                .get_member(workspace_id, target)?
                .ok_or(MembershipError::MemberNotFound)?;
            if current.role == Role::Owner {
                require_role(actor.role, Role::Owner)?;
            }
        }

        match self.store.remove_member_guarded(workspace_id, target)? {
            MemberWriteOutcome::Applied => {}
            MemberWriteOutcome::MemberNotFound => return Err(MembershipError::MemberNotFound),
            MemberWriteOutcome::WouldOrphanWorkspace => return Err(MembershipError::LastOwner),
        }

        tracing::info!(workspace = %workspace_id, target = %target, "removed member");
        Ok(())
    }

    fn issue_invite(
        &self,
        workspace_id: &WorkspaceId,
        acting: &UserId,
    ) -> Result<Invite, MembershipError> {
        let actor = self.member_of(workspace_id, acting)?;
        require_role(actor.role, Role::Admin)?;

        let invite = Invite::new(workspace_id.clone(), acting.clone(), self.invite_ttl);

        // Replaces any previous live invite for this workspace
        self.store.create_invite_exclusive(&invite)?;

        tracing::info!(workspace = %workspace_id, invite = %invite.id, "issued invite");
        Ok(invite)
    }

    fn redeem_invite(
        &self,
        token: &str,
        user_id: &UserId,
    ) -> Result<WorkspaceMember, MembershipError> {
        match self
            .store
            .redeem_invite_atomic(token, user_id, Timestamp::now())?
        {
            RedeemOutcome::Joined(member) => {
                tracing::info!(
                    workspace = %member.workspace_id,
                    user = %user_id,
                    "invite redeemed"
                );
                Ok(member)
            }
            // Repeat redemption by the consuming user returns the existing
            // membership instead of erroring
            RedeemOutcome::AlreadyMember(member) => Ok(member),
            RedeemOutcome::InvalidOrExpired => {
                Err(MembershipError::Invite(InviteError::InvalidOrExpired))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WorkspaceRegistry, UserId, UserId) {
        let store = DeskSqlStore::memory().unwrap();
        let registry = WorkspaceRegistry::new(store, Duration::from_secs(3600));
        (registry, UserId::generate(), UserId::generate())
    }

    #[test]
    fn test_create_workspace_seeds_owner() {
        let (registry, alice, _) = setup();

        let ws = registry.create_workspace("Newsroom", &alice).unwrap();
        let (resolved, role) = registry
            .resolve_workspace(&WorkspaceSelector::Id(ws.id.clone()), &alice)
            .unwrap();

        assert_eq!(resolved.id, ws.id);
        assert_eq!(role, Role::Owner);
    }

    #[test]
    fn test_resolve_by_slug() {
        let (registry, alice, _) = setup();
        let ws = registry.create_workspace("Morning Desk", &alice).unwrap();

        let (resolved, _) = registry
            .resolve_workspace(&WorkspaceSelector::Slug("morning-desk".to_string()), &alice)
            .unwrap();
        assert_eq!(resolved.id, ws.id);
    }

    #[test]
    fn test_slug_collision_gets_suffix() {
        let (registry, alice, _) = setup();

        let first = registry.create_workspace("Newsroom", &alice).unwrap();
        let second = registry.create_workspace("Newsroom", &alice).unwrap();

        assert_eq!(first.slug, "newsroom");
        assert!(second.slug.starts_with("newsroom-"));
        assert_ne!(first.slug, second.slug);
    }

    #[test]
    fn test_non_member_cannot_resolve() {
        let (registry, alice, mallory) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let result = registry.resolve_workspace(&WorkspaceSelector::Id(ws.id), &mallory);
        assert!(matches!(result, Err(MembershipError::NotAMember)));
    }

    #[test]
    fn test_invite_flow_defaults_to_viewer() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        let member = registry.redeem_invite(&invite.token, &bob).unwrap();

        assert_eq!(member.role, Role::Viewer);
        assert_eq!(member.invited_by, Some(alice.clone()));

        let (_, role) = registry
            .resolve_workspace(&WorkspaceSelector::Id(ws.id), &bob)
            .unwrap();
        assert_eq!(role, Role::Viewer);
    }

    #[test]
    fn test_redeem_is_idempotent_for_same_user() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        let first = registry.redeem_invite(&invite.token, &bob).unwrap();
        let second = registry.redeem_invite(&invite.token, &bob).unwrap();

        assert_eq!(first.workspace_id, second.workspace_id);
        assert_eq!(first.joined_at, second.joined_at);
    }

    #[test]
    fn test_consumed_invite_rejects_other_users() {
        let (registry, alice, bob) = setup();
        let carol = UserId::generate();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();

        let result = registry.redeem_invite(&invite.token, &carol);
        assert!(matches!(
            result,
            Err(MembershipError::Invite(InviteError::InvalidOrExpired))
        ));
    }

    #[test]
    fn test_new_invite_invalidates_previous() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let stale = registry.issue_invite(&ws.id, &alice).unwrap();
        let fresh = registry.issue_invite(&ws.id, &alice).unwrap();

        assert!(matches!(
            registry.redeem_invite(&stale.token, &bob),
            Err(MembershipError::Invite(InviteError::InvalidOrExpired))
        ));
        assert!(registry.redeem_invite(&fresh.token, &bob).is_ok());
    }

    #[test]
    fn test_viewer_cannot_issue_invite() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();

        assert!(matches!(
            registry.issue_invite(&ws.id, &bob),
            Err(MembershipError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn test_last_owner_cannot_demote_self() {
        let (registry, alice, _) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let result = registry.update_member_role(&ws.id, &alice, &alice, Role::Admin);
        assert!(matches!(result, Err(MembershipError::LastOwner)));
    }

    #[test]
    fn test_owner_demotion_allowed_with_second_owner() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();
        registry
            .update_member_role(&ws.id, &alice, &bob, Role::Owner)
            .unwrap();

        let demoted = registry
            .update_member_role(&ws.id, &alice, &alice, Role::Admin)
            .unwrap();
        assert_eq!(demoted.role, Role::Admin);
    }

    #[test]
    fn test_admin_cannot_grant_ownership() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();
        registry
            .update_member_role(&ws.id, &alice, &bob, Role::Admin)
            .unwrap();

        let carol = UserId::generate();
        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &carol).unwrap();

        assert!(matches!(
            registry.update_member_role(&ws.id, &bob, &carol, Role::Owner),
            Err(MembershipError::InsufficientRole { minimum: Role::Owner })
        ));
    }

    #[test]
    fn test_member_may_leave_but_last_owner_may_not() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();

        registry.remove_member(&ws.id, &bob, &bob).unwrap();
        assert!(matches!(
            registry.resolve_workspace(&WorkspaceSelector::Id(ws.id.clone()), &bob),
            Err(MembershipError::NotAMember)
        ));

        assert!(matches!(
            registry.remove_member(&ws.id, &alice, &alice),
            Err(MembershipError::LastOwner)
        ));
    }

    #[test]
    fn test_delete_workspace_requires_owner() {
        let (registry, alice, bob) = setup();
        let ws = registry.create_workspace("Newsroom", &alice).unwrap();

        let invite = registry.issue_invite(&ws.id, &alice).unwrap();
        registry.redeem_invite(&invite.token, &bob).unwrap();

        assert!(matches!(
            registry.delete_workspace(&ws.id, &bob),
            Err(MembershipError::InsufficientRole { .. })
        ));

        registry.delete_workspace(&ws.id, &alice).unwrap();
        assert!(matches!(
            registry.get_workspace(&WorkspaceSelector::Id(ws.id)),
            Err(WorkspaceError::NotFound)
        ));
    }
}
