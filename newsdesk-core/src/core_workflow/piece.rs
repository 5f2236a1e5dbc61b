//! Piece data structures and the board state machine

use serde::{Deserialize, Serialize};
use std::fmt;

use super::inbox::ReviewState;
use super::WorkflowError;
use crate::model::{PieceId, StoryId, Timestamp, UserId, WorkspaceId};

/// Workflow state of a piece
///
/// Declared in board order; `Archived` sits outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceState {
    Scripting,
    Multimedia,
    Finalization,
    Published,
    Archived,
}

impl PieceState {
    /// Convert PieceState to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceState::Scripting => "scripting",
            PieceState::Multimedia => "multimedia",
            PieceState::Finalization => "finalization",
            PieceState::Published => "published",
            PieceState::Archived => "archived",
        }
    }

    /// Parse a string into a PieceState
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scripting" => Some(PieceState::Scripting),
            "multimedia" => Some(PieceState::Multimedia),
            "finalization" => Some(PieceState::Finalization),
            "published" => Some(PieceState::Published),
            "archived" => Some(PieceState::Archived),
            _ => None,
        }
    }

    /// Board column index; `None` for archived
    fn column(&self) -> Option<usize> {
        match self {
            PieceState::Scripting => Some(0),
            PieceState::Multimedia => Some(1),
            PieceState::Finalization => Some(2),
            PieceState::Published => Some(3),
            PieceState::Archived => None,
        }
    }
}

impl fmt::Display for PieceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a board transition
///
/// Ordinary moves are one column at a time in either direction; `force`
/// (admin-level) bypasses the adjacency check for corrections. Archival is
/// reachable from any board state, but leaving `Archived` always goes
/// through the explicit restore operation, force or not.
pub fn validate_transition(
    from: PieceState,
    to: PieceState,
    force: bool,
) -> Result<(), WorkflowError> {
    if from == PieceState::Archived {
        return Err(WorkflowError::InvalidTransition { from, to });
    }
    if to == PieceState::Archived {
        return Ok(());
    }
    if from == to {
        return Err(WorkflowError::InvalidTransition { from, to });
    }

    let from_col = from.column().expect("non-archived state has a column");
    let to_col = to.column().expect("non-archived state has a column");
    let adjacent = from_col.abs_diff(to_col) == 1;

    if adjacent || force {
        return Ok(());
    }

    Err(WorkflowError::InvalidTransition { from, to })
}

/// A piece is a single deliverable with its own workflow state
///
/// Pieces may link to several stories; each piece's lifecycle is independent
/// even when linked to the same story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    /// Unique identifier
    pub id: PieceId,

    /// Owning workspace, immutable after creation
    pub workspace_id: WorkspaceId,

    /// Stories this piece belongs to (many-to-many)
    pub linked_story_ids: Vec<StoryId>,

    /// Story the piece was spawned from, if any
    pub created_from_story_id: Option<StoryId>,

    /// Deliverable format ("video", "article", ...)
    pub format: String,

    /// Working headline
    pub headline: String,

    /// Board state
    pub state: PieceState,

    /// Board state before archival; consulted by restore
    pub previous_state: Option<PieceState>,

    /// Monotonic script version counter (script bodies live elsewhere)
    pub current_script_version: i64,

    /// Who created the piece
    pub created_by: UserId,

    /// Ideas-inbox review markers
    pub review: ReviewState,

    /// When the piece was created
    pub created_at: Timestamp,

    /// Last time the piece was updated
    pub updated_at: Timestamp,
}

impl Piece {
    /// Create a new piece in the `Scripting` column
    pub fn new(
        workspace_id: WorkspaceId,
        headline: String,
        format: String,
        created_by: UserId,
    ) -> Self {
        let now = Timestamp::now();

        Piece {
            id: PieceId::generate(),
            workspace_id,
            linked_story_ids: Vec::new(),
            created_from_story_id: None,
            format,
            headline,
            state: PieceState::Scripting,
            previous_state: None,
            current_script_version: 1,
            created_by,
            review: ReviewState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Archive the piece, remembering where it was on the board
    pub fn archive(&mut self) -> Result<(), WorkflowError> {
        if self.state == PieceState::Archived {
            return Err(WorkflowError::InvalidTransition {
                from: PieceState::Archived,
                to: PieceState::Archived,
            });
        }
        self.previous_state = Some(self.state);
        self.state = PieceState::Archived;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Return the piece to its last non-archived state
    pub fn restore(&mut self) -> Result<(), WorkflowError> {
        if self.state != PieceState::Archived {
            return Err(WorkflowError::NotArchived);
        }
        self.state = self.previous_state.take().unwrap_or(PieceState::Scripting);
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
