//! Story and piece workflow operations

use std::sync::Arc;

use super::resolve_caller;
use crate::error::ApiResult;
use newsdesk_core::core_identity::{Authenticator, Credential};
use newsdesk_core::core_workflow::{
    Piece, PieceDraft, PiecePatch, PieceState, Story, StoryDraft, StoryPatch, WorkflowEngine,
};
use newsdesk_core::core_workspace::{WorkspaceRegistry, WorkspaceSelector};
use newsdesk_core::model::{PieceId, StoryId, Timestamp};

/// Story/piece lifecycle operations behind the workspace gate
#[derive(Clone)]
pub struct WorkflowService {
    authenticator: Arc<Authenticator>,
    registry: Arc<WorkspaceRegistry>,
    engine: WorkflowEngine,
}

impl WorkflowService {
    pub fn new(
        authenticator: Arc<Authenticator>,
        registry: Arc<WorkspaceRegistry>,
        engine: WorkflowEngine,
    ) -> Self {
        Self {
            authenticator,
            registry,
            engine,
        }
    }

    // ===== Stories =====

    pub async fn create_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        draft: StoryDraft,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.create_story(&ws.id, role, &user.id, draft)?)
    }

    pub async fn get_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
    ) -> ApiResult<Story> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.get_story(&ws.id, story_id)?)
    }

    pub async fn list_stories(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Vec<Story>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.list_stories(&ws.id)?)
    }

    /// The ideas inbox as of now
    pub async fn list_story_inbox(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Vec<Story>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.list_story_inbox(&ws.id, Timestamp::now())?)
    }

    pub async fn update_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
        patch: StoryPatch,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .update_story(&ws.id, role, &user.id, story_id, patch)?)
    }

    pub async fn approve_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.approve_story(&ws.id, role, &user.id, story_id)?)
    }

    pub async fn reject_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
        reason: &str,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .reject_story(&ws.id, role, &user.id, story_id, reason)?)
    }

    pub async fn park_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
        until: Timestamp,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .park_story(&ws.id, role, &user.id, story_id, until)?)
    }

    pub async fn archive_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.archive_story(&ws.id, role, &user.id, story_id)?)
    }

    pub async fn restore_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.restore_story(&ws.id, role, &user.id, story_id)?)
    }

    pub async fn delete_story(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        story_id: &StoryId,
    ) -> ApiResult<()> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.delete_story(&ws.id, role, &user.id, story_id)?)
    }

    /// Replace a package's ordered children
    pub async fn set_child_order(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        parent_id: &StoryId,
        ordered_children: &[StoryId],
    ) -> ApiResult<Story> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .set_child_order(&ws.id, role, &user.id, parent_id, ordered_children)?)
    }

    // ===== Pieces =====

    pub async fn create_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        draft: PieceDraft,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.create_piece(&ws.id, role, &user.id, draft)?)
    }

    pub async fn get_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
    ) -> ApiResult<Piece> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.get_piece(&ws.id, piece_id)?)
    }

    pub async fn list_pieces(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Vec<Piece>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.list_pieces(&ws.id)?)
    }

    pub async fn list_piece_inbox(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
    ) -> ApiResult<Vec<Piece>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.list_piece_inbox(&ws.id, Timestamp::now())?)
    }

    pub async fn update_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
        patch: PiecePatch,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .update_piece(&ws.id, role, &user.id, piece_id, patch)?)
    }

    /// Record a new script version from the script collaborator
    pub async fn bump_script_version(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .bump_script_version(&ws.id, role, &user.id, piece_id)?)
    }

    /// Move a piece along the board; `force` requires admin
    pub async fn transition_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
        to: PieceState,
        force: bool,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .transition_piece(&ws.id, role, &user.id, piece_id, to, force)?)
    }

    pub async fn restore_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.restore_piece(&ws.id, role, &user.id, piece_id)?)
    }

    pub async fn approve_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.engine.approve_piece(&ws.id, role, &user.id, piece_id)?)
    }

    pub async fn reject_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
        reason: &str,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .reject_piece(&ws.id, role, &user.id, piece_id, reason)?)
    }

    pub async fn park_piece(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        piece_id: &PieceId,
        until: Timestamp,
    ) -> ApiResult<Piece> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .engine
            .park_piece(&ws.id, role, &user.id, piece_id, until)?)
    }
}
