//! Fact-check data structures and the status machine

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{CommentId, FactCheckId, PieceId, StoryId, Timestamp, UserId, WorkspaceId};

/// What kind of verification a flagged span needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactCheckKind {
    /// A factual claim to confirm
    Claim,
    /// An open question for the reporter
    Question,
    /// A statement that needs a citable source
    SourceNeeded,
}

impl FactCheckKind {
    /// Convert FactCheckKind to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCheckKind::Claim => "claim",
            FactCheckKind::Question => "question",
            FactCheckKind::SourceNeeded => "source_needed",
        }
    }

    /// Parse a string into a FactCheckKind
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "claim" => Some(FactCheckKind::Claim),
            "question" => Some(FactCheckKind::Question),
            "source_needed" => Some(FactCheckKind::SourceNeeded),
            _ => None,
        }
    }
}

impl fmt::Display for FactCheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactCheckStatus {
    Pending,
    Verified,
    Disputed,
}

impl FactCheckStatus {
    /// Convert FactCheckStatus to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FactCheckStatus::Pending => "pending",
            FactCheckStatus::Verified => "verified",
            FactCheckStatus::Disputed => "disputed",
        }
    }

    /// Parse a string into a FactCheckStatus
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FactCheckStatus::Pending),
            "verified" => Some(FactCheckStatus::Verified),
            "disputed" => Some(FactCheckStatus::Disputed),
            _ => None,
        }
    }

    /// Whether a status change is legal
    ///
    /// Leaving `pending` is irreversible; verdict corrections between
    /// `verified` and `disputed` go both ways.
    pub fn can_transition(self, to: FactCheckStatus) -> bool {
        use FactCheckStatus::*;
        matches!(
            (self, to),
            (Pending, Verified) | (Pending, Disputed) | (Verified, Disputed) | (Disputed, Verified)
        )
    }

    /// Whether this status still needs reviewer attention
    pub fn is_open(self) -> bool {
        matches!(self, FactCheckStatus::Pending | FactCheckStatus::Disputed)
    }
}

impl fmt::Display for FactCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The entity a fact-check is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckParent {
    Story(StoryId),
    Piece(PieceId),
}

/// The flagged span of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    /// Span start offset in the script body
    pub start: u32,

    /// Span end offset (exclusive)
    pub end: u32,

    /// The selected text at flag time
    pub text: String,
}

impl TextSelection {
    /// Whether the selection is structurally valid
    pub fn is_valid(&self) -> bool {
        self.start < self.end && !self.text.is_empty()
    }
}

/// A flagged span requiring verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheck {
    /// Unique identifier
    pub id: FactCheckId,

    /// Owning workspace, immutable after creation
    pub workspace_id: WorkspaceId,

    /// Story or piece the check belongs to
    pub parent: CheckParent,

    /// Kind of verification needed
    pub kind: FactCheckKind,

    /// The flagged span
    pub selection: TextSelection,

    /// Verification status
    pub status: FactCheckStatus,

    /// Reviewer note
    pub note: String,

    /// Who flagged the span
    pub created_by: UserId,

    /// When the check was created
    pub created_at: Timestamp,

    /// Last status change
    pub updated_at: Timestamp,
}

impl FactCheck {
    /// Flag a new span, starting in `pending`
    pub fn new(
        workspace_id: WorkspaceId,
        parent: CheckParent,
        kind: FactCheckKind,
        selection: TextSelection,
        note: String,
        created_by: UserId,
    ) -> Self {
        let now = Timestamp::now();

        FactCheck {
            id: FactCheckId::generate(),
            workspace_id,
            parent,
            kind,
            selection,
            status: FactCheckStatus::Pending,
            note,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One entry in a fact-check's append-only comment thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckComment {
    /// Unique identifier
    pub id: CommentId,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Thread the comment belongs to
    pub fact_check_id: FactCheckId,

    /// Comment author
    pub author: UserId,

    /// Comment body
    pub body: String,

    /// When the comment was posted
    pub created_at: Timestamp,
}

impl CheckComment {
    /// Append a new comment to a thread
    pub fn new(
        workspace_id: WorkspaceId,
        fact_check_id: FactCheckId,
        author: UserId,
        body: String,
    ) -> Self {
        CheckComment {
            id: CommentId::generate(),
            workspace_id,
            fact_check_id,
            author,
            body,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            FactCheckKind::Claim,
            FactCheckKind::Question,
            FactCheckKind::SourceNeeded,
        ] {
            assert_eq!(FactCheckKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(FactCheckKind::from_str("rumor"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            FactCheckStatus::Pending,
            FactCheckStatus::Verified,
            FactCheckStatus::Disputed,
        ] {
            assert_eq!(FactCheckStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_pending_exit_is_irreversible() {
        use FactCheckStatus::*;

        assert!(Pending.can_transition(Verified));
        assert!(Pending.can_transition(Disputed));
        assert!(Verified.can_transition(Disputed));
        assert!(Disputed.can_transition(Verified));

        assert!(!Verified.can_transition(Pending));
        assert!(!Disputed.can_transition(Pending));
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        use FactCheckStatus::*;

        assert!(!Pending.can_transition(Pending));
        assert!(!Verified.can_transition(Verified));
        assert!(!Disputed.can_transition(Disputed));
    }

    #[test]
    fn test_open_statuses() {
        assert!(FactCheckStatus::Pending.is_open());
        assert!(FactCheckStatus::Disputed.is_open());
        assert!(!FactCheckStatus::Verified.is_open());
    }

    #[test]
    fn test_selection_validity() {
        let good = TextSelection {
            start: 10,
            end: 25,
            text: "the mayor said".to_string(),
        };
        assert!(good.is_valid());

        let inverted = TextSelection {
            start: 25,
            end: 10,
            text: "x".to_string(),
        };
        assert!(!inverted.is_valid());

        let empty = TextSelection {
            start: 0,
            end: 1,
            text: String::new(),
        };
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_new_check_starts_pending() {
        let check = FactCheck::new(
            WorkspaceId::generate(),
            CheckParent::Story(StoryId::generate()),
            FactCheckKind::Claim,
            TextSelection {
                start: 0,
                end: 5,
                text: "97 %".to_string(),
            },
            String::new(),
            UserId::generate(),
        );

        assert_eq!(check.status, FactCheckStatus::Pending);
    }
}
