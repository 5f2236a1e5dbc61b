//! Workflow engine over the SQL store
//!
//! Every mutating operation assumes the caller has already resolved the
//! acting user's role in the target workspace; the engine re-checks the
//! operation-specific minimum with `require_role` and records an activity
//! entry on success.

use std::sync::Arc;

use super::inbox::ReviewState;
use super::piece::{self, Piece, PieceState};
use super::story::{ChecklistItem, Story, StoryState, TeamMember};
use super::WorkflowError;
use crate::core_activity::{ActivityRecorder, NewActivity};
use crate::core_workspace::{require_role, Role};
use crate::model::{PieceId, StoryId, Timestamp, UserId, WorkspaceId};
use crate::storage::{ChildOrderOutcome, DeskSqlStore};

/// Fields for a new story
#[derive(Debug, Clone)]
pub struct StoryDraft {
    pub headline: String,
    pub description: String,
    pub categories: Vec<String>,
}

/// Partial update to a story; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct StoryPatch {
    pub headline: Option<String>,
    pub description: Option<String>,
    pub state: Option<StoryState>,
    pub team_members: Option<Vec<TeamMember>>,
    pub categories: Option<Vec<String>>,
    pub checklist: Option<Vec<ChecklistItem>>,
}

/// Fields for a new piece
#[derive(Debug, Clone)]
pub struct PieceDraft {
    pub headline: String,
    pub format: String,
    pub linked_story_ids: Vec<StoryId>,
    pub created_from_story_id: Option<StoryId>,
}

/// Partial update to a piece; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct PiecePatch {
    pub headline: Option<String>,
    pub format: Option<String>,
    pub linked_story_ids: Option<Vec<StoryId>>,
}

/// Story/piece lifecycle engine
#[derive(Clone)]
pub struct WorkflowEngine {
    store: DeskSqlStore,
    recorder: Arc<dyn ActivityRecorder>,
}

impl WorkflowEngine {
    /// Create an engine over the shared store and activity recorder
    pub fn new(store: DeskSqlStore, recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self { store, recorder }
    }

    fn validate_headline(headline: &str) -> Result<(), WorkflowError> {
        if headline.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Headline must not be empty".to_string(),
            ));
        }
        if headline.len() > 300 {
            return Err(WorkflowError::InvalidInput(
                "Headline must be at most 300 characters".to_string(),
            ));
        }
        Ok(())
    }

    // ===== Story operations =====

    /// Create a story in the ideas inbox
    pub fn create_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        draft: StoryDraft,
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;
        Self::validate_headline(&draft.headline)?;

        let mut story = Story::new(
            workspace_id.clone(),
            draft.headline.trim().to_string(),
            draft.description,
            actor.clone(),
        );
        story.categories = draft.categories;

        self.store.create_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            "story.created",
            serde_json::json!({ "headline": story.headline }),
        ))?;

        tracing::info!(workspace = %workspace_id, story = %story.id, "created story");
        Ok(story)
    }

    /// Fetch a story; soft-deleted stories and ids from other workspaces are
    /// equally absent
    pub fn get_story(
        &self,
        workspace_id: &WorkspaceId,
        story_id: &StoryId,
    ) -> Result<Story, WorkflowError> {
        self.store
            .get_story(workspace_id, story_id)?
            .filter(|s| s.deleted_at.is_none())
            .ok_or(WorkflowError::StoryNotFound)
    }

    /// All stories participating in active views
    pub fn list_stories(&self, workspace_id: &WorkspaceId) -> Result<Vec<Story>, WorkflowError> {
        let stories = self.store.list_stories(workspace_id)?;
        Ok(stories.into_iter().filter(|s| s.is_active()).collect())
    }

    /// Stories awaiting review and currently visible in the ideas inbox
    pub fn list_story_inbox(
        &self,
        workspace_id: &WorkspaceId,
        now: Timestamp,
    ) -> Result<Vec<Story>, WorkflowError> {
        let stories = self.store.list_stories(workspace_id)?;
        Ok(stories
            .into_iter()
            .filter(|s| s.is_active() && s.review.in_inbox(now))
            .collect())
    }

    /// Rejected stories, excluded from active views but still queryable
    pub fn list_rejected_stories(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Story>, WorkflowError> {
        let stories = self.store.list_stories(workspace_id)?;
        Ok(stories
            .into_iter()
            .filter(|s| s.deleted_at.is_none() && s.review.rejected_at.is_some())
            .collect())
    }

    /// Apply a partial update to a story
    pub fn update_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
        patch: StoryPatch,
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut story = self.get_story(workspace_id, story_id)?;

        if let Some(headline) = patch.headline {
            Self::validate_headline(&headline)?;
            story.headline = headline.trim().to_string();
        }
        if let Some(description) = patch.description {
            story.description = description;
        }
        if let Some(state) = patch.state {
            // Legacy field; informational only, no transition rules
            story.state = state;
        }
        if let Some(team_members) = patch.team_members {
            story.team_members = team_members;
        }
        if let Some(categories) = patch.categories {
            story.categories = categories;
        }
        if let Some(checklist) = patch.checklist {
            story.checklist = checklist;
        }
        story.updated_at = Timestamp::now();

        self.persist_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            "story.updated",
            serde_json::json!({}),
        ))?;

        Ok(story)
    }

    /// Archive a story
    pub fn archive_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut story = self.get_story(workspace_id, story_id)?;

        let now = Timestamp::now();
        story.archived_at = Some(now);
        story.updated_at = now;

        self.persist_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            "story.archived",
            serde_json::json!({}),
        ))?;

        Ok(story)
    }

    /// Bring an archived story back into active views
    pub fn restore_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut story = self.get_story(workspace_id, story_id)?;

        if story.archived_at.is_none() {
            return Err(WorkflowError::NotArchived);
        }
        story.archived_at = None;
        story.updated_at = Timestamp::now();

        self.persist_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            "story.restored",
            serde_json::json!({}),
        ))?;

        Ok(story)
    }

    /// Soft-delete a story
    pub fn delete_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
    ) -> Result<(), WorkflowError> {
        require_role(role, Role::Admin)?;
        let mut story = self.get_story(workspace_id, story_id)?;

        let now = Timestamp::now();
        story.deleted_at = Some(now);
        story.updated_at = now;

        self.persist_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            "story.deleted",
            serde_json::json!({}),
        ))?;

        Ok(())
    }

    /// Approve a story out of the ideas inbox
    pub fn approve_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
    ) -> Result<Story, WorkflowError> {
        self.review_story(workspace_id, role, actor, story_id, "story.approved", |r, now| {
            r.approve(actor.clone(), now)
        })
    }

    /// Reject a story with a reason
    pub fn reject_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
        reason: &str,
    ) -> Result<Story, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Rejection reason must not be empty".to_string(),
            ));
        }
        let reason = reason.trim().to_string();
        self.review_story(workspace_id, role, actor, story_id, "story.rejected", |r, now| {
            r.reject(reason.clone(), now)
        })
    }

    /// Park a story until a later instant
    pub fn park_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
        until: Timestamp,
    ) -> Result<Story, WorkflowError> {
        self.review_story(workspace_id, role, actor, story_id, "story.parked", |r, _now| {
            r.park(until)
        })
    }

    fn review_story(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        story_id: &StoryId,
        action: &str,
        apply: impl FnOnce(&mut ReviewState, Timestamp),
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut story = self.get_story(workspace_id, story_id)?;

        let now = Timestamp::now();
        apply(&mut story.review, now);
        story.updated_at = now;

        self.persist_story(&story)?;
        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            story.id.clone(),
            actor.clone(),
            action,
            serde_json::json!({}),
        ))?;

        Ok(story)
    }

    /// Replace a package's ordered children
    ///
    /// Validation and write happen in one transaction: every id must belong
    /// to this workspace, must not already sit under a different parent, and
    /// the resulting graph must keep every story off its own ancestor chain.
    pub fn set_child_order(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        parent_id: &StoryId,
        ordered_children: &[StoryId],
    ) -> Result<Story, WorkflowError> {
        require_role(role, Role::Editor)?;

        let mut seen = std::collections::HashSet::new();
        for child in ordered_children {
            if !seen.insert(child) {
                return Err(WorkflowError::InvalidInput(
                    "Duplicate story in child order".to_string(),
                ));
            }
        }

        match self
            .store
            .set_child_order_txn(workspace_id, parent_id, ordered_children)?
        {
            ChildOrderOutcome::Applied => {}
            ChildOrderOutcome::ParentNotFound | ChildOrderOutcome::ChildNotFound => {
                return Err(WorkflowError::StoryNotFound)
            }
            ChildOrderOutcome::ChildInAnotherPackage => {
                return Err(WorkflowError::AlreadyInPackage)
            }
            ChildOrderOutcome::Cycle => return Err(WorkflowError::ChildOrderCycle),
        }

        self.recorder.record(NewActivity::for_story(
            workspace_id.clone(),
            parent_id.clone(),
            actor.clone(),
            "story.children_reordered",
            serde_json::json!({ "count": ordered_children.len() }),
        ))?;

        self.get_story(workspace_id, parent_id)
    }

    fn persist_story(&self, story: &Story) -> Result<(), WorkflowError> {
        if !self.store.update_story(story)? {
            return Err(WorkflowError::StoryNotFound);
        }
        Ok(())
    }

    // ===== Piece operations =====

    /// Create a piece, optionally linked to existing stories
    pub fn create_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        draft: PieceDraft,
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;
        Self::validate_headline(&draft.headline)?;
        if draft.format.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Format must not be empty".to_string(),
            ));
        }

        // Links must resolve inside this workspace; foreign ids look absent
        for story_id in &draft.linked_story_ids {
            self.get_story(workspace_id, story_id)?;
        }
        if let Some(origin) = &draft.created_from_story_id {
            self.get_story(workspace_id, origin)?;
        }

        let mut new_piece = Piece::new(
            workspace_id.clone(),
            draft.headline.trim().to_string(),
            draft.format.trim().to_string(),
            actor.clone(),
        );
        new_piece.linked_story_ids = draft.linked_story_ids;
        new_piece.created_from_story_id = draft.created_from_story_id;

        self.store.create_piece(&new_piece)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            new_piece.id.clone(),
            actor.clone(),
            "piece.created",
            serde_json::json!({ "format": new_piece.format }),
        ))?;

        tracing::info!(workspace = %workspace_id, piece = %new_piece.id, "created piece");
        Ok(new_piece)
    }

    /// Fetch a piece within the caller's workspace
    pub fn get_piece(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Piece, WorkflowError> {
        self.store
            .get_piece(workspace_id, piece_id)?
            .ok_or(WorkflowError::PieceNotFound)
    }

    /// All pieces in a workspace
    pub fn list_pieces(&self, workspace_id: &WorkspaceId) -> Result<Vec<Piece>, WorkflowError> {
        Ok(self.store.list_pieces(workspace_id)?)
    }

    /// Pieces awaiting review and currently visible in the ideas inbox
    pub fn list_piece_inbox(
        &self,
        workspace_id: &WorkspaceId,
        now: Timestamp,
    ) -> Result<Vec<Piece>, WorkflowError> {
        let pieces = self.store.list_pieces(workspace_id)?;
        Ok(pieces
            .into_iter()
            .filter(|p| p.state != PieceState::Archived && p.review.in_inbox(now))
            .collect())
    }

    /// Apply a partial update to a piece
    pub fn update_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
        patch: PiecePatch,
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut target = self.get_piece(workspace_id, piece_id)?;

        if let Some(headline) = patch.headline {
            Self::validate_headline(&headline)?;
            target.headline = headline.trim().to_string();
        }
        if let Some(format) = patch.format {
            if format.trim().is_empty() {
                return Err(WorkflowError::InvalidInput(
                    "Format must not be empty".to_string(),
                ));
            }
            target.format = format.trim().to_string();
        }
        if let Some(linked) = patch.linked_story_ids {
            for story_id in &linked {
                self.get_story(workspace_id, story_id)?;
            }
            target.linked_story_ids = linked;
        }
        target.updated_at = Timestamp::now();

        self.persist_piece(&target)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            target.id.clone(),
            actor.clone(),
            "piece.updated",
            serde_json::json!({}),
        ))?;

        Ok(target)
    }

    /// Record that the script collaborator produced a new script version
    pub fn bump_script_version(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut target = self.get_piece(workspace_id, piece_id)?;

        target.current_script_version += 1;
        target.updated_at = Timestamp::now();

        self.persist_piece(&target)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            target.id.clone(),
            actor.clone(),
            "piece.script_version_bumped",
            serde_json::json!({ "version": target.current_script_version }),
        ))?;

        Ok(target)
    }

    /// Move a piece along the board
    ///
    /// Ordinary moves go one column at a time; `force` needs admin and
    /// bypasses only the adjacency rule. A target of `Archived` behaves like
    /// the archive operation.
    pub fn transition_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
        to: PieceState,
        force: bool,
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;
        if force {
            require_role(role, Role::Admin)?;
        }

        let mut target = self.get_piece(workspace_id, piece_id)?;
        let from = target.state;

        piece::validate_transition(from, to, force)?;
        if to == PieceState::Archived {
            target.archive()?;
        } else {
            target.state = to;
            target.updated_at = Timestamp::now();
        }

        self.persist_piece(&target)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            target.id.clone(),
            actor.clone(),
            "piece.transitioned",
            serde_json::json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "force": force,
            }),
        ))?;

        tracing::info!(
            workspace = %workspace_id,
            piece = %target.id,
            from = %from,
            to = %to,
            force,
            "piece transitioned"
        );
        Ok(target)
    }

    /// Return an archived piece to its last board state
    pub fn restore_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;

        let mut target = self.get_piece(workspace_id, piece_id)?;
        target.restore()?;

        self.persist_piece(&target)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            target.id.clone(),
            actor.clone(),
            "piece.restored",
            serde_json::json!({ "to": target.state.as_str() }),
        ))?;

        Ok(target)
    }

    /// Approve a piece out of the ideas inbox
    pub fn approve_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
    ) -> Result<Piece, WorkflowError> {
        self.review_piece(workspace_id, role, actor, piece_id, "piece.approved", |r, now| {
            r.approve(actor.clone(), now)
        })
    }

    /// Reject a piece with a reason
    pub fn reject_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
        reason: &str,
    ) -> Result<Piece, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "Rejection reason must not be empty".to_string(),
            ));
        }
        let reason = reason.trim().to_string();
        self.review_piece(workspace_id, role, actor, piece_id, "piece.rejected", |r, now| {
            r.reject(reason.clone(), now)
        })
    }

    /// Park a piece until a later instant
    pub fn park_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
        until: Timestamp,
    ) -> Result<Piece, WorkflowError> {
        self.review_piece(workspace_id, role, actor, piece_id, "piece.parked", |r, _now| {
            r.park(until)
        })
    }

    fn review_piece(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        piece_id: &PieceId,
        action: &str,
        apply: impl FnOnce(&mut ReviewState, Timestamp),
    ) -> Result<Piece, WorkflowError> {
        require_role(role, Role::Editor)?;
        let mut target = self.get_piece(workspace_id, piece_id)?;

        let now = Timestamp::now();
        apply(&mut target.review, now);
        target.updated_at = now;

        self.persist_piece(&target)?;
        self.recorder.record(NewActivity::for_piece(
            workspace_id.clone(),
            target.id.clone(),
            actor.clone(),
            action,
            serde_json::json!({}),
        ))?;

        Ok(target)
    }

    fn persist_piece(&self, target: &Piece) -> Result<(), WorkflowError> {
        if !self.store.update_piece(target)? {
            return Err(WorkflowError::PieceNotFound);
        }
        Ok(())
    }
}
