//! Fact-check verification operations

use std::sync::Arc;

use super::resolve_caller;
use crate::error::ApiResult;
use newsdesk_core::core_factcheck::{
    CheckComment, CheckParent, FactCheck, FactCheckKind, FactCheckManager, FactCheckStatus,
    TextSelection,
};
use newsdesk_core::core_identity::{Authenticator, Credential};
use newsdesk_core::core_workspace::{WorkspaceRegistry, WorkspaceSelector};
use newsdesk_core::model::FactCheckId;

/// Fact-check lifecycle operations behind the workspace gate
#[derive(Clone)]
pub struct FactCheckService {
    authenticator: Arc<Authenticator>,
    registry: Arc<WorkspaceRegistry>,
    manager: FactCheckManager,
}

impl FactCheckService {
    pub fn new(
        authenticator: Arc<Authenticator>,
        registry: Arc<WorkspaceRegistry>,
        manager: FactCheckManager,
    ) -> Self {
        Self {
            authenticator,
            registry,
            manager,
        }
    }

    /// Flag a text span for verification
    pub async fn create(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        parent: CheckParent,
        kind: FactCheckKind,
        selection: TextSelection,
        note: String,
    ) -> ApiResult<FactCheck> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .manager
            .create(&ws.id, role, &user.id, parent, kind, selection, note)?)
    }

    /// Fetch one fact-check
    pub async fn get(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        check_id: &FactCheckId,
    ) -> ApiResult<FactCheck> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.manager.get(&ws.id, check_id)?)
    }

    /// All fact-checks on one story or piece
    pub async fn list_for_parent(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        parent: &CheckParent,
    ) -> ApiResult<Vec<FactCheck>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.manager.list_for_parent(&ws.id, parent)?)
    }

    /// Move a fact-check between statuses
    pub async fn update_status(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        check_id: &FactCheckId,
        new_status: FactCheckStatus,
    ) -> ApiResult<FactCheck> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .manager
            .update_status(&ws.id, role, &user.id, check_id, new_status)?)
    }

    /// Append a comment to a fact-check thread
    pub async fn add_comment(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        check_id: &FactCheckId,
        body: &str,
    ) -> ApiResult<CheckComment> {
        let (user, ws, role) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self
            .manager
            .add_comment(&ws.id, role, &user.id, check_id, body)?)
    }

    /// A fact-check's comment thread
    pub async fn list_comments(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        check_id: &FactCheckId,
    ) -> ApiResult<Vec<CheckComment>> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.manager.list_comments(&ws.id, check_id)?)
    }

    /// Count of open (pending or disputed) checks on one story or piece
    pub async fn open_check_count(
        &self,
        credential: &Credential,
        workspace: &WorkspaceSelector,
        parent: &CheckParent,
    ) -> ApiResult<u32> {
        let (_, ws, _) =
            resolve_caller(&self.authenticator, &self.registry, credential, workspace)?;
        Ok(self.manager.open_check_count(&ws.id, parent)?)
    }
}
