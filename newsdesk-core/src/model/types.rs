/*
    types.rs - Common types shared by every newsdesk module

    Defines:
    - Timestamps
    - IDs for users, workspaces, stories, pieces, fact-checks, comments, invites
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp representing the current time
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_millis() as u64)
    }

    /// Create a timestamp from milliseconds since epoch
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    /// Get milliseconds since epoch
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by a duration
    pub fn plus(&self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_millis() as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: String) -> Self {
        UserId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        UserId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a workspace (the tenant boundary)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

impl WorkspaceId {
    pub fn new(id: String) -> Self {
        WorkspaceId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        WorkspaceId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a story
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(pub String);

impl StoryId {
    pub fn new(id: String) -> Self {
        StoryId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        StoryId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a piece (a single deliverable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(pub String);

impl PieceId {
    pub fn new(id: String) -> Self {
        PieceId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        PieceId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a fact-check item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactCheckId(pub String);

impl FactCheckId {
    pub fn new(id: String) -> Self {
        FactCheckId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        FactCheckId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for FactCheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: String) -> Self {
        CommentId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        CommentId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a workspace invite
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InviteId(pub String);

impl InviteId {
    pub fn new(id: String) -> Self {
        InviteId(id)
    }

    pub fn generate() -> Self {
        use uuid::Uuid;
        InviteId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let ts1 = Timestamp::now();
        let ts2 = Timestamp::now();
        assert!(ts2.as_millis() >= ts1.as_millis());
    }

    #[test]
    fn test_timestamp_from_millis() {
        let ts = Timestamp::from_millis(1234567890);
        assert_eq!(ts.as_millis(), 1234567890);
    }

    #[test]
    fn test_timestamp_ordering() {
        let ts1 = Timestamp::from_millis(100);
        let ts2 = Timestamp::from_millis(200);
        assert!(ts1 < ts2);
    }

    #[test]
    fn test_timestamp_plus() {
        let ts = Timestamp::from_millis(1000);
        let later = ts.plus(Duration::from_secs(2));
        assert_eq!(later.as_millis(), 3000);
    }

    #[test]
    fn test_user_id_generation() {
        let id1 = UserId::generate();
        let id2 = UserId::generate();
        assert_ne!(id1, id2);
        assert!(!id1.0.is_empty());
    }

    #[test]
    fn test_workspace_id_generation() {
        let id1 = WorkspaceId::generate();
        let id2 = WorkspaceId::generate();
        assert_ne!(id1, id2);
        assert!(!id1.0.is_empty());
    }

    #[test]
    fn test_story_id_display_round_trip() {
        let id = StoryId::generate();
        let display = format!("{}", id);
        assert_eq!(StoryId::new(display), id);
    }
}
