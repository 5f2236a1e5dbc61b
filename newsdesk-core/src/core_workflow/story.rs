//! Story data structures

use serde::{Deserialize, Serialize};
use std::fmt;

use super::inbox::ReviewState;
use crate::model::{StoryId, Timestamp, UserId, WorkspaceId};

/// Legacy story-level state
///
/// Superseded by per-piece state, which is authoritative; this field is kept
/// as a display artifact and is never enforced by the transition engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryState {
    Idea,
    Research,
    Scripting,
    Multimedia,
    Finalization,
    Published,
    Archived,
}

impl StoryState {
    /// Convert StoryState to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Idea => "idea",
            StoryState::Research => "research",
            StoryState::Scripting => "scripting",
            StoryState::Multimedia => "multimedia",
            StoryState::Finalization => "finalization",
            StoryState::Published => "published",
            StoryState::Archived => "archived",
        }
    }

    /// Parse a string into a StoryState
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idea" => Some(StoryState::Idea),
            "research" => Some(StoryState::Research),
            "scripting" => Some(StoryState::Scripting),
            "multimedia" => Some(StoryState::Multimedia),
            "finalization" => Some(StoryState::Finalization),
            "published" => Some(StoryState::Published),
            "archived" => Some(StoryState::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named production role on a story team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member user id
    pub user_id: UserId,

    /// Production role label ("reporter", "producer", ...)
    pub role: String,
}

/// A single checklist entry on a story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// What needs doing
    pub label: String,

    /// Whether it is done
    pub done: bool,
}

/// An editorial unit that spawns pieces and may group into a parent package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier
    pub id: StoryId,

    /// Owning workspace, immutable after creation
    pub workspace_id: WorkspaceId,

    /// Working headline
    pub headline: String,

    /// Longer pitch or summary
    pub description: String,

    /// Legacy informational state
    pub state: StoryState,

    /// Parent package, when this story is a child
    pub parent_story_id: Option<StoryId>,

    /// Ordered child stories, when this story is a package
    pub child_order: Vec<StoryId>,

    /// Production team
    pub team_members: Vec<TeamMember>,

    /// Topical categories
    pub categories: Vec<String>,

    /// Pre-production checklist
    pub checklist: Vec<ChecklistItem>,

    /// Ideas-inbox review markers
    pub review: ReviewState,

    /// Set when the story is archived
    pub archived_at: Option<Timestamp>,

    /// Set when the story is soft-deleted
    pub deleted_at: Option<Timestamp>,

    /// Who created the story
    pub created_by: UserId,

    /// When the story was created
    pub created_at: Timestamp,

    /// Last time the story was updated
    pub updated_at: Timestamp,
}

impl Story {
    /// Create a new story in the ideas inbox
    pub fn new(
        workspace_id: WorkspaceId,
        headline: String,
        description: String,
        created_by: UserId,
    ) -> Self {
        let now = Timestamp::now();

        Story {
            id: StoryId::generate(),
            workspace_id,
            headline,
            description,
            state: StoryState::Idea,
            parent_story_id: None,
            child_order: Vec::new(),
            team_members: Vec::new(),
            categories: Vec::new(),
            checklist: Vec::new(),
            review: ReviewState::default(),
            archived_at: None,
            deleted_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this story is a parent package
    pub fn is_package(&self) -> bool {
        !self.child_order.is_empty()
    }

    /// Whether the story participates in active board views
    pub fn is_active(&self) -> bool {
        self.archived_at.is_none() && self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_state_round_trip() {
        for state in [
            StoryState::Idea,
            StoryState::Research,
            StoryState::Scripting,
            StoryState::Multimedia,
            StoryState::Finalization,
            StoryState::Published,
            StoryState::Archived,
        ] {
            assert_eq!(StoryState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(StoryState::from_str("pitch"), None);
    }

    #[test]
    fn test_new_story_starts_as_idea() {
        let story = Story::new(
            WorkspaceId::generate(),
            "Ferry strike".to_string(),
            "Dock workers walk out Friday".to_string(),
            UserId::generate(),
        );

        assert_eq!(story.state, StoryState::Idea);
        assert!(story.review.is_pending());
        assert!(story.is_active());
        assert!(!story.is_package());
    }

    #[test]
    fn test_archived_story_is_inactive() {
        let mut story = Story::new(
            WorkspaceId::generate(),
            "Headline".to_string(),
            String::new(),
            UserId::generate(),
        );

        story.archived_at = Some(Timestamp::now());
        assert!(!story.is_active());
    }
}
