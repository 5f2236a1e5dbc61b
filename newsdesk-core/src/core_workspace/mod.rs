//! Workspace registry, membership, and invites
//!
//! The workspace is the isolation boundary: every scoped entity carries its
//! workspace id, and every scoped operation resolves (workspace, role) for
//! the acting user before touching anything else.
//!
//! ## Key design principles
//!
//! 1. One role per user per workspace, totally ordered
//!    (`Viewer < Editor < Admin < Owner`)
//! 2. A single `require_role` capability check instead of per-role dispatch
//! 3. A workspace always retains at least one owner
//! 4. At most one live invite per workspace; redemption is a single
//!    compare-and-set

pub mod invite;
pub mod manager;
pub mod member;
pub mod registry;
pub mod workspace;

pub use invite::{Invite, InviteError};
pub use manager::{MembershipError, MembershipManager, WorkspaceManager};
pub use member::{require_role, Role, WorkspaceMember};
pub use registry::WorkspaceRegistry;
pub use workspace::{Workspace, WorkspaceError, WorkspaceSelector};
