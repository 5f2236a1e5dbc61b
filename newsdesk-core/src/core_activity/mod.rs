//! Append-only activity record
//!
//! Every state-changing workflow and fact-check action appends an entry
//! keyed by its story or piece. The `ActivityRecorder` trait is the seam the
//! external feed/notification collaborator consumes; this crate ships the
//! store-backed implementation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{PieceId, StoryId, Timestamp, UserId, WorkspaceId};
use crate::storage::DeskSqlStore;

/// A recorded state-changing action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Append order (storage rowid)
    pub id: i64,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Subject story, if any
    pub story_id: Option<StoryId>,

    /// Subject piece, if any
    pub piece_id: Option<PieceId>,

    /// Who performed the action
    pub actor: UserId,

    /// Action name, e.g. "piece.transitioned"
    pub action: String,

    /// When it happened
    pub at: Timestamp,

    /// Action-specific detail
    pub metadata: serde_json::Value,
}

/// A pending activity entry, before storage assigns id and order
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub workspace_id: WorkspaceId,
    pub story_id: Option<StoryId>,
    pub piece_id: Option<PieceId>,
    pub actor: UserId,
    pub action: String,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    /// An entry about a story
    pub fn for_story(
        workspace_id: WorkspaceId,
        story_id: StoryId,
        actor: UserId,
        action: &str,
        metadata: serde_json::Value,
    ) -> Self {
        NewActivity {
            workspace_id,
            story_id: Some(story_id),
            piece_id: None,
            actor,
            action: action.to_string(),
            metadata,
        }
    }

    /// An entry about a piece
    pub fn for_piece(
        workspace_id: WorkspaceId,
        piece_id: PieceId,
        actor: UserId,
        action: &str,
        metadata: serde_json::Value,
    ) -> Self {
        NewActivity {
            workspace_id,
            story_id: None,
            piece_id: Some(piece_id),
            actor,
            action: action.to_string(),
            metadata,
        }
    }
}

/// Recorder seam consumed by the external feed collaborator
pub trait ActivityRecorder: Send + Sync {
    /// Append one entry
    fn record(&self, entry: NewActivity) -> Result<(), ActivityError>;

    /// Entries about one story, oldest first
    fn list_for_story(
        &self,
        workspace_id: &WorkspaceId,
        story_id: &StoryId,
    ) -> Result<Vec<ActivityEntry>, ActivityError>;

    /// Entries about one piece, oldest first
    fn list_for_piece(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Vec<ActivityEntry>, ActivityError>;
}

/// Activity recording errors
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}

/// Store-backed recorder
#[derive(Clone)]
pub struct SqlActivityRecorder {
    store: DeskSqlStore,
}

impl SqlActivityRecorder {
    /// Create a recorder over the shared store
    pub fn new(store: DeskSqlStore) -> Self {
        Self { store }
    }
}

impl ActivityRecorder for SqlActivityRecorder {
    fn record(&self, entry: NewActivity) -> Result<(), ActivityError> {
        self.store.append_activity(&entry, Timestamp::now())?;
        Ok(())
    }

    fn list_for_story(
        &self,
        workspace_id: &WorkspaceId,
        story_id: &StoryId,
    ) -> Result<Vec<ActivityEntry>, ActivityError> {
        Ok(self.store.list_activity_for_story(workspace_id, story_id)?)
    }

    fn list_for_piece(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Vec<ActivityEntry>, ActivityError> {
        Ok(self.store.list_activity_for_piece(workspace_id, piece_id)?)
    }
}
