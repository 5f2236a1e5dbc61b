//! Transport-free operation surface
//!
//! Each service runs the full request pipeline: authenticate the bearer
//! credential, resolve the per-request workspace selector into a
//! (workspace, role) pair, check the operation's minimum role, then call
//! into the core. Transport collaborators only translate their own request
//! shapes into these calls.

pub mod account_service;
pub mod factcheck_service;
pub mod workflow_service;
pub mod workspace_service;

pub use account_service::AccountService;
pub use factcheck_service::FactCheckService;
pub use workflow_service::WorkflowService;
pub use workspace_service::WorkspaceService;

use crate::error::ApiResult;
use newsdesk_core::core_identity::{Authenticator, Credential, User};
use newsdesk_core::core_workspace::{
    MembershipManager, Role, Workspace, WorkspaceRegistry, WorkspaceSelector,
};

/// Resolve the acting user and their standing in the target workspace
pub(crate) fn resolve_caller(
    authenticator: &Authenticator,
    registry: &WorkspaceRegistry,
    credential: &Credential,
    workspace: &WorkspaceSelector,
) -> ApiResult<(User, Workspace, Role)> {
    let user = authenticator.authenticate(credential)?;
    let (resolved, role) = registry.resolve_workspace(workspace, &user.id)?;
    tracing::debug!(user = %user.id, workspace = %resolved.id, role = %role, "resolved caller");
    Ok((user, resolved, role))
}
