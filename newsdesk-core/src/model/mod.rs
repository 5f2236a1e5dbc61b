//! Shared model primitives: identifiers and timestamps.

pub mod types;

pub use types::{
    CommentId, FactCheckId, InviteId, PieceId, StoryId, Timestamp, UserId, WorkspaceId,
};
