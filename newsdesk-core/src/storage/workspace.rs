//! Workspace, membership, and invite storage operations
//!
//! The guarded writes here (role mutation, member removal, invite
//! redemption) run inside IMMEDIATE transactions: SQLite takes the write
//! lock up front, so the check and the write cannot interleave with a
//! concurrent writer.

use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use super::{DeskSqlStore, StoreError};
use crate::core_workspace::{Invite, Role, Workspace, WorkspaceMember};
use crate::model::{InviteId, Timestamp, UserId, WorkspaceId};

/// Result of a guarded member write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberWriteOutcome {
    /// The write was applied
    Applied,
    /// No such member in this workspace
    MemberNotFound,
    /// The write would leave the workspace with zero owners
    WouldOrphanWorkspace,
}

/// Result of an atomic invite redemption
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    /// The token was consumed and a membership created
    Joined(WorkspaceMember),
    /// The caller already holds a membership (idempotent repeat)
    AlreadyMember(WorkspaceMember),
    /// Unknown, expired, or consumed by someone else
    InvalidOrExpired,
}

fn workspace_from_row(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: WorkspaceId::new(row.get(0)?),
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: Timestamp::from_millis(row.get::<_, i64>(3)?.max(0) as u64),
        updated_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<WorkspaceMember> {
    let role: String = row.get(2)?;

    Ok(WorkspaceMember {
        workspace_id: WorkspaceId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        role: Role::from_str(&role).unwrap_or(Role::Viewer),
        joined_at: Timestamp::from_millis(row.get::<_, i64>(3)?.max(0) as u64),
        invited_by: row.get::<_, Option<String>>(4)?.map(UserId::new),
    })
}

const WORKSPACE_COLUMNS: &str = "id, name, slug, created_at, updated_at";
const MEMBER_COLUMNS: &str = "workspace_id, user_id, role, joined_at, invited_by";

impl DeskSqlStore {
    // ===== Workspace operations =====

    /// Insert a new workspace together with its founding owner
    pub fn create_workspace(
        &self,
        workspace: &Workspace,
        founder: &WorkspaceMember,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO workspaces (id, name, slug, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                workspace.id.to_string(),
                &workspace.name,
                &workspace.slug,
                workspace.created_at.as_millis() as i64,
                workspace.updated_at.as_millis() as i64,
            ],
        )?;

        tx.execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at, invited_by)
             VALUES (?, ?, ?, ?, ?)",
            params![
                founder.workspace_id.to_string(),
                founder.user_id.to_string(),
                founder.role.as_str(),
                founder.joined_at.as_millis() as i64,
                founder.invited_by.as_ref().map(|id| id.to_string()),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Get a workspace by id
    pub fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn()?;

        let workspace = conn
            .query_row(
                &format!("SELECT {} FROM workspaces WHERE id = ?", WORKSPACE_COLUMNS),
                params![workspace_id.to_string()],
                workspace_from_row,
            )
            .optional()?;

        Ok(workspace)
    }

    /// Get a workspace by slug
    pub fn get_workspace_by_slug(&self, slug: &str) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn()?;

        let workspace = conn
            .query_row(
                &format!("SELECT {} FROM workspaces WHERE slug = ?", WORKSPACE_COLUMNS),
                params![slug],
                workspace_from_row,
            )
            .optional()?;

        Ok(workspace)
    }

    /// Delete a workspace (cascades to every scoped table)
    pub fn delete_workspace(&self, workspace_id: &WorkspaceId) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "DELETE FROM workspaces WHERE id = ?",
            params![workspace_id.to_string()],
        )?;

        Ok(rows > 0)
    }

    /// List workspaces a user is a member of
    pub fn list_user_workspaces(&self, user_id: &UserId) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT w.id, w.name, w.slug, w.created_at, w.updated_at
             FROM workspaces w
             JOIN workspace_members m ON m.workspace_id = w.id
             WHERE m.user_id = ?
             ORDER BY m.joined_at DESC",
        )?;

        let workspaces = stmt
            .query_map(params![user_id.to_string()], workspace_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(workspaces)
    }

    // ===== Member operations =====

    /// Get one member of a workspace
    pub fn get_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Option<WorkspaceMember>, StoreError> {
        let conn = self.conn()?;

        let member = conn
            .query_row(
                &format!(
                    "SELECT {} FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
                    MEMBER_COLUMNS
                ),
                params![workspace_id.to_string(), user_id.to_string()],
                member_from_row,
            )
            .optional()?;

        Ok(member)
    }

    /// List all members of a workspace
    pub fn list_members(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<WorkspaceMember>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workspace_members WHERE workspace_id = ? ORDER BY joined_at",
            MEMBER_COLUMNS
        ))?;

        let members = stmt
            .query_map(params![workspace_id.to_string()], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(members)
    }

    /// Change a member's role, refusing to orphan the workspace
    ///
    /// The owner count check and the write are one atomic unit; two
    /// concurrent demotions cannot both observe "another owner exists".
    pub fn update_member_role_guarded(
        &self,
        workspace_id: &WorkspaceId,
        target: &UserId,
        new_role: Role,
    ) -> Result<MemberWriteOutcome, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT role FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
                params![workspace_id.to_string(), target.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let current = match current {
            Some(role) => role,
            None => return Ok(MemberWriteOutcome::MemberNotFound),
        };

        if current == Role::Owner.as_str() && new_role != Role::Owner {
            let other_owners: i64 = tx.query_row(
                "SELECT COUNT(*) FROM workspace_members
                 WHERE workspace_id = ? AND role = 'owner' AND user_id != ?",
                params![workspace_id.to_string(), target.to_string()],
                |row| row.get(0),
            )?;
            if other_owners == 0 {
                return Ok(MemberWriteOutcome::WouldOrphanWorkspace);
            }
        }

        tx.execute(
            "UPDATE workspace_members SET role = ? WHERE workspace_id = ? AND user_id = ?",
            params![new_role.as_str(), workspace_id.to_string(), target.to_string()],
        )?;

        tx.commit()?;
        Ok(MemberWriteOutcome::Applied)
    }

    /// Remove a member, refusing to orphan the workspace
    pub fn remove_member_guarded(
        &self,
        workspace_id: &WorkspaceId,
        target: &UserId,
    ) -> Result<MemberWriteOutcome, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT role FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
                params![workspace_id.to_string(), target.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let current = match current {
            Some(role) => role,
            None => return Ok(MemberWriteOutcome::MemberNotFound),
        };

        if current == Role::Owner.as_str() {
            let other_owners: i64 = tx.query_row(
                "SELECT COUNT(*) FROM workspace_members
                 WHERE workspace_id = ? AND role = 'owner' AND user_id != ?",
                params![workspace_id.to_string(), target.to_string()],
                |row| row.get(0),
            )?;
            if other_owners == 0 {
                return Ok(MemberWriteOutcome::WouldOrphanWorkspace);
            }
        }

        tx.execute(
            "DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
            params![workspace_id.to_string(), target.to_string()],
        )?;

        tx.commit()?;
        Ok(MemberWriteOutcome::Applied)
    }

    // ===== Invite operations =====

    /// Insert a new invite, deleting any unconsumed predecessor so at most
    /// one live invite exists per workspace
    pub fn create_invite_exclusive(&self, invite: &Invite) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM invites WHERE workspace_id = ? AND consumed_at IS NULL",
            params![invite.workspace_id.to_string()],
        )?;

        tx.execute(
            "INSERT INTO invites
             (id, workspace_id, token, issuer, created_at, expires_at, consumed_at, consumed_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                invite.id.to_string(),
                invite.workspace_id.to_string(),
                &invite.token,
                invite.issuer.to_string(),
                invite.created_at.as_millis() as i64,
                invite.expires_at.as_millis() as i64,
                invite.consumed_at.map(|t| t.as_millis() as i64),
                invite.consumed_by.as_ref().map(|id| id.to_string()),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Consume an invite token and create (or return) the membership
    ///
    /// Exactly one caller can consume a given token; repeats by the
    /// consuming user are answered with the existing membership.
    pub fn redeem_invite_atomic(
        &self,
        token: &str,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<RedeemOutcome, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let invite: Option<(InviteId, WorkspaceId, UserId, i64, Option<i64>, Option<String>)> = tx
            .query_row(
                "SELECT id, workspace_id, issuer, expires_at, consumed_at, consumed_by
                 FROM invites WHERE token = ?",
                params![token],
                |row| {
                    Ok((
                        InviteId::new(row.get(0)?),
                        WorkspaceId::new(row.get(1)?),
                        UserId::new(row.get(2)?),
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let (invite_id, workspace_id, issuer, expires_at, consumed_at, consumed_by) = match invite {
            Some(row) => row,
            None => return Ok(RedeemOutcome::InvalidOrExpired),
        };

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {} FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
                    MEMBER_COLUMNS
                ),
                params![workspace_id.to_string(), user_id.to_string()],
                member_from_row,
            )
            .optional()?;

        if consumed_at.is_some() {
            // Only the consuming user gets the idempotent answer
            if consumed_by.as_deref() == Some(user_id.0.as_str()) {
                if let Some(member) = existing {
                    return Ok(RedeemOutcome::AlreadyMember(member));
                }
            }
            return Ok(RedeemOutcome::InvalidOrExpired);
        }

        if now.as_millis() as i64 >= expires_at {
            return Ok(RedeemOutcome::InvalidOrExpired);
        }

        tx.execute(
            "UPDATE invites SET consumed_at = ?, consumed_by = ? WHERE id = ? AND consumed_at IS NULL",
            params![
                now.as_millis() as i64,
                user_id.to_string(),
                invite_id.to_string()
            ],
        )?;

        if let Some(member) = existing {
            tx.commit()?;
            return Ok(RedeemOutcome::AlreadyMember(member));
        }

        let member = WorkspaceMember {
            workspace_id: workspace_id.clone(),
            user_id: user_id.clone(),
            role: Role::Viewer,
            joined_at: now,
            invited_by: Some(issuer),
        };

        tx.execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role, joined_at, invited_by)
             VALUES (?, ?, ?, ?, ?)",
            params![
                member.workspace_id.to_string(),
                member.user_id.to_string(),
                member.role.as_str(),
                member.joined_at.as_millis() as i64,
                member.invited_by.as_ref().map(|id| id.to_string()),
            ],
        )?;

        tx.commit()?;
        Ok(RedeemOutcome::Joined(member))
    }
}
