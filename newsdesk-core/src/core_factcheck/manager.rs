//! Fact-check manager over the SQL store

use std::sync::Arc;

use super::factcheck::{
    CheckComment, CheckParent, FactCheck, FactCheckKind, FactCheckStatus, TextSelection,
};
use super::FactCheckError;
use crate::core_activity::{ActivityRecorder, NewActivity};
use crate::core_workflow::WorkflowEngine;
use crate::core_workspace::{require_role, Role};
use crate::model::{FactCheckId, Timestamp, UserId, WorkspaceId};
use crate::storage::DeskSqlStore;

/// Fact-check lifecycle manager
#[derive(Clone)]
pub struct FactCheckManager {
    store: DeskSqlStore,
    workflow: WorkflowEngine,
    recorder: Arc<dyn ActivityRecorder>,
}

impl FactCheckManager {
    /// Create a manager over the shared store and activity recorder
    pub fn new(
        store: DeskSqlStore,
        workflow: WorkflowEngine,
        recorder: Arc<dyn ActivityRecorder>,
    ) -> Self {
        Self {
            store,
            workflow,
            recorder,
        }
    }

    /// Verify the parent entity exists in this workspace
    fn check_parent(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
    ) -> Result<(), FactCheckError> {
        match parent {
            CheckParent::Story(story_id) => {
                self.workflow.get_story(workspace_id, story_id)?;
            }
            CheckParent::Piece(piece_id) => {
                self.workflow.get_piece(workspace_id, piece_id)?;
            }
        }
        Ok(())
    }

    fn record_for_parent(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
        actor: &UserId,
        action: &str,
        metadata: serde_json::Value,
    ) -> Result<(), FactCheckError> {
        let entry = match parent {
            CheckParent::Story(story_id) => NewActivity::for_story(
                workspace_id.clone(),
                story_id.clone(),
                actor.clone(),
                action,
                metadata,
            ),
            CheckParent::Piece(piece_id) => NewActivity::for_piece(
                workspace_id.clone(),
                piece_id.clone(),
                actor.clone(),
                action,
                metadata,
            ),
        };
        self.recorder.record(entry)?;
        Ok(())
    }

    /// Flag a span for verification
    pub fn create(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        parent: CheckParent,
        kind: FactCheckKind,
        selection: TextSelection,
        note: String,
    ) -> Result<FactCheck, FactCheckError> {
        require_role(role, Role::Editor)?;

        if !selection.is_valid() {
            return Err(FactCheckError::InvalidInput(
                "Selection must cover a non-empty forward span".to_string(),
            ));
        }
        self.check_parent(workspace_id, &parent)?;

        let check = FactCheck::new(
            workspace_id.clone(),
            parent,
            kind,
            selection,
            note,
            actor.clone(),
        );

        self.store.create_fact_check(&check)?;
        self.record_for_parent(
            workspace_id,
            &check.parent,
            actor,
            "factcheck.created",
            serde_json::json!({ "kind": check.kind.as_str() }),
        )?;

        tracing::info!(workspace = %workspace_id, check = %check.id, "flagged fact-check");
        Ok(check)
    }

    /// Fetch a fact-check within the caller's workspace
    pub fn get(
        &self,
        workspace_id: &WorkspaceId,
        check_id: &FactCheckId,
    ) -> Result<FactCheck, FactCheckError> {
        self.store
            .get_fact_check(workspace_id, check_id)?
            .ok_or(FactCheckError::NotFound)
    }

    /// All fact-checks on one story or piece, oldest first
    pub fn list_for_parent(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
    ) -> Result<Vec<FactCheck>, FactCheckError> {
        Ok(self.store.list_fact_checks(workspace_id, parent)?)
    }

    /// Move a fact-check between statuses
    pub fn update_status(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        check_id: &FactCheckId,
        new_status: FactCheckStatus,
    ) -> Result<FactCheck, FactCheckError> {
        require_role(role, Role::Editor)?;

        let mut check = self.get(workspace_id, check_id)?;
        if !check.status.can_transition(new_status) {
            return Err(FactCheckError::InvalidTransition {
                from: check.status,
                to: new_status,
            });
        }

        let from = check.status;
        check.status = new_status;
        check.updated_at = Timestamp::now();

        if !self.store.update_fact_check(&check)? {
            return Err(FactCheckError::NotFound);
        }
        self.record_for_parent(
            workspace_id,
            &check.parent,
            actor,
            "factcheck.status_changed",
            serde_json::json!({ "from": from.as_str(), "to": new_status.as_str() }),
        )?;

        Ok(check)
    }

    /// Append a comment to a fact-check's thread
    pub fn add_comment(
        &self,
        workspace_id: &WorkspaceId,
        role: Role,
        actor: &UserId,
        check_id: &FactCheckId,
        body: &str,
    ) -> Result<CheckComment, FactCheckError> {
        require_role(role, Role::Editor)?;

        if body.trim().is_empty() {
            return Err(FactCheckError::InvalidInput(
                "Comment body must not be empty".to_string(),
            ));
        }

        // Comments never target an absent thread
        let check = self.get(workspace_id, check_id)?;

        let comment = CheckComment::new(
            workspace_id.clone(),
            check.id.clone(),
            actor.clone(),
            body.trim().to_string(),
        );
        self.store.add_check_comment(&comment)?;

        self.record_for_parent(
            workspace_id,
            &check.parent,
            actor,
            "factcheck.commented",
            serde_json::json!({}),
        )?;

        Ok(comment)
    }

    /// A fact-check's comment thread, oldest first
    pub fn list_comments(
        &self,
        workspace_id: &WorkspaceId,
        check_id: &FactCheckId,
    ) -> Result<Vec<CheckComment>, FactCheckError> {
        // Surfaces NotFound for absent or foreign threads
        self.get(workspace_id, check_id)?;
        Ok(self.store.list_check_comments(workspace_id, check_id)?)
    }

    /// Count of checks still needing attention (pending or disputed),
    /// consumed by the external board-summary collaborator
    pub fn open_check_count(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
    ) -> Result<u32, FactCheckError> {
        Ok(self.store.count_open_checks(workspace_id, parent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_activity::SqlActivityRecorder;
    use crate::core_workflow::StoryDraft;
    use crate::model::StoryId;

    fn setup() -> (FactCheckManager, WorkflowEngine, WorkspaceId, UserId) {
        let store = DeskSqlStore::memory().unwrap();
        let (workspace, owner) = crate::test_utils::seed_workspace(&store, "Newsroom");
        let recorder = Arc::new(SqlActivityRecorder::new(store.clone()));
        let workflow = WorkflowEngine::new(store.clone(), recorder.clone());
        let manager = FactCheckManager::new(store, workflow.clone(), recorder);
        (manager, workflow, workspace, owner)
    }

    fn story_parent(workflow: &WorkflowEngine, workspace: &WorkspaceId, user: &UserId) -> CheckParent {
        let story = workflow
            .create_story(
                workspace,
                Role::Editor,
                user,
                StoryDraft {
                    headline: "Reservoir levels".to_string(),
                    description: String::new(),
                    categories: Vec::new(),
                },
            )
            .unwrap();
        CheckParent::Story(story.id)
    }

    fn selection() -> TextSelection {
        TextSelection {
            start: 14,
            end: 42,
            text: "at a ten-year low".to_string(),
        }
    }

    #[test]
    fn test_create_starts_pending() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);

        let check = manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent,
                FactCheckKind::Claim,
                selection(),
                "check against the survey".to_string(),
            )
            .unwrap();

        assert_eq!(check.status, FactCheckStatus::Pending);
        assert_eq!(manager.get(&workspace, &check.id).unwrap().id, check.id);
    }

    #[test]
    fn test_create_rejects_missing_parent() {
        let (manager, _, workspace, alice) = setup();

        let result = manager.create(
            &workspace,
            Role::Editor,
            &alice,
            CheckParent::Story(StoryId::generate()),
            FactCheckKind::Claim,
            selection(),
            String::new(),
        );
        assert!(matches!(result, Err(FactCheckError::Workflow(_))));
    }

    #[test]
    fn test_status_corrections_but_never_back_to_pending() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);
        let check = manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent,
                FactCheckKind::Question,
                selection(),
                String::new(),
            )
            .unwrap();

        let verified = manager
            .update_status(&workspace, Role::Editor, &alice, &check.id, FactCheckStatus::Verified)
            .unwrap();
        assert_eq!(verified.status, FactCheckStatus::Verified);

        let disputed = manager
            .update_status(&workspace, Role::Editor, &alice, &check.id, FactCheckStatus::Disputed)
            .unwrap();
        assert_eq!(disputed.status, FactCheckStatus::Disputed);

        let corrected = manager
            .update_status(&workspace, Role::Editor, &alice, &check.id, FactCheckStatus::Verified)
            .unwrap();
        assert_eq!(corrected.status, FactCheckStatus::Verified);

        let back_to_pending = manager.update_status(
            &workspace,
            Role::Editor,
            &alice,
            &check.id,
            FactCheckStatus::Pending,
        );
        assert!(matches!(
            back_to_pending,
            Err(FactCheckError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_comment_thread_is_ordered_and_guarded() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);
        let check = manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent,
                FactCheckKind::SourceNeeded,
                selection(),
                String::new(),
            )
            .unwrap();

        manager
            .add_comment(&workspace, Role::Editor, &alice, &check.id, "asked the utility")
            .unwrap();
        manager
            .add_comment(&workspace, Role::Editor, &alice, &check.id, "report attached")
            .unwrap();

        let thread = manager.list_comments(&workspace, &check.id).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].body, "asked the utility");
        assert_eq!(thread[1].body, "report attached");

        // Commenting on an unknown id fails with NotFound
        let missing = manager.add_comment(
            &workspace,
            Role::Editor,
            &alice,
            &FactCheckId::generate(),
            "into the void",
        );
        assert!(matches!(missing, Err(FactCheckError::NotFound)));
    }

    #[test]
    fn test_cross_workspace_check_is_not_found() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);
        let check = manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent,
                FactCheckKind::Claim,
                selection(),
                String::new(),
            )
            .unwrap();

        let other_workspace = WorkspaceId::generate();
        assert!(matches!(
            manager.get(&other_workspace, &check.id),
            Err(FactCheckError::NotFound)
        ));
        assert!(matches!(
            manager.add_comment(&other_workspace, Role::Editor, &alice, &check.id, "hi"),
            Err(FactCheckError::NotFound)
        ));
    }

    #[test]
    fn test_open_check_count_tracks_pending_and_disputed() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);

        let first = manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent.clone(),
                FactCheckKind::Claim,
                selection(),
                String::new(),
            )
            .unwrap();
        manager
            .create(
                &workspace,
                Role::Editor,
                &alice,
                parent.clone(),
                FactCheckKind::Question,
                selection(),
                String::new(),
            )
            .unwrap();

        assert_eq!(manager.open_check_count(&workspace, &parent).unwrap(), 2);

        manager
            .update_status(&workspace, Role::Editor, &alice, &first.id, FactCheckStatus::Verified)
            .unwrap();
        assert_eq!(manager.open_check_count(&workspace, &parent).unwrap(), 1);

        manager
            .update_status(&workspace, Role::Editor, &alice, &first.id, FactCheckStatus::Disputed)
            .unwrap();
        assert_eq!(manager.open_check_count(&workspace, &parent).unwrap(), 2);
    }

    #[test]
    fn test_viewer_cannot_mutate() {
        let (manager, workflow, workspace, alice) = setup();
        let parent = story_parent(&workflow, &workspace, &alice);

        let result = manager.create(
            &workspace,
            Role::Viewer,
            &alice,
            parent,
            FactCheckKind::Claim,
            selection(),
            String::new(),
        );
        assert!(matches!(result, Err(FactCheckError::Membership(_))));
    }
}
