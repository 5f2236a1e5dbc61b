//! Story and piece workflow
//!
//! Pieces move along the board `scripting ↔ multimedia ↔ finalization ↔
//! published` one column at a time; archival is reachable from any state and
//! undone only by an explicit restore. Stories keep a legacy informational
//! state plus the ideas-inbox review markers shared with pieces, and may be
//! grouped into parent packages with an acyclic child ordering.

pub mod engine;
pub mod inbox;
pub mod piece;
pub mod story;

pub use engine::{PieceDraft, PiecePatch, StoryDraft, StoryPatch, WorkflowEngine};
pub use inbox::ReviewState;
pub use piece::{Piece, PieceState};
pub use story::{ChecklistItem, Story, StoryState, TeamMember};

use thiserror::Error;

/// Workflow operation errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Absent ids and ids belonging to another workspace are reported
    /// identically
    #[error("Story not found")]
    StoryNotFound,

    #[error("Piece not found")]
    PieceNotFound,

    #[error("Cannot move piece from {from} to {to}")]
    InvalidTransition { from: PieceState, to: PieceState },

    #[error("Piece is not archived")]
    NotArchived,

    #[error("Story is already part of another package")]
    AlreadyInPackage,

    #[error("Child ordering would make a story its own ancestor")]
    ChildOrderCycle,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Membership error: {0}")]
    Membership(#[from] crate::core_workspace::MembershipError),

    #[error("Activity error: {0}")]
    Activity(#[from] crate::core_activity::ActivityError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}
