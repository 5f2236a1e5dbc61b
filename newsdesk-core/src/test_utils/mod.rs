//! Shared helpers for tests

use crate::core_workspace::{Role, Workspace, WorkspaceMember};
use crate::model::{UserId, WorkspaceId};
use crate::storage::DeskSqlStore;

/// Insert a workspace with a fresh owner, returning both ids
pub fn seed_workspace(store: &DeskSqlStore, name: &str) -> (WorkspaceId, UserId) {
    let owner = UserId::generate();
    let workspace = Workspace::new(name.to_string());
    let founder = WorkspaceMember {
        workspace_id: workspace.id.clone(),
        user_id: owner.clone(),
        role: Role::Owner,
        joined_at: workspace.created_at,
        invited_by: None,
    };

    store
        .create_workspace(&workspace, &founder)
        .expect("seed workspace");

    (workspace.id, owner)
}
