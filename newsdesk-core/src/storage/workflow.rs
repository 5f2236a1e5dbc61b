//! Story and piece storage operations

use std::collections::HashSet;

use rusqlite::{params, types::Type, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::{DeskSqlStore, StoreError};
use crate::core_workflow::{Piece, PieceState, ReviewState, Story, StoryState};
use crate::model::{PieceId, StoryId, Timestamp, UserId, WorkspaceId};

/// Result of an atomic child-order rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOrderOutcome {
    /// The ordering was applied
    Applied,
    /// The parent does not exist in this workspace
    ParentNotFound,
    /// A listed child does not exist in this workspace
    ChildNotFound,
    /// A listed child already sits under a different parent
    ChildInAnotherPackage,
    /// The ordering would make a story its own ancestor
    Cycle,
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn millis(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    Ok(Timestamp::from_millis(row.get::<_, i64>(idx)?.max(0) as u64))
}

fn opt_millis(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .map(|v| Timestamp::from_millis(v.max(0) as u64)))
}

fn review_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<ReviewState> {
    Ok(ReviewState {
        approved: row.get::<_, i64>(base)? != 0,
        approved_by: row.get::<_, Option<String>>(base + 1)?.map(UserId::new),
        approved_at: opt_millis(row, base + 2)?,
        rejected_at: opt_millis(row, base + 3)?,
        rejection_reason: row.get(base + 4)?,
        parked_until: opt_millis(row, base + 5)?,
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    let state: String = row.get(4)?;

    Ok(Story {
        id: StoryId::new(row.get(0)?),
        workspace_id: WorkspaceId::new(row.get(1)?),
        headline: row.get(2)?,
        description: row.get(3)?,
        state: StoryState::from_str(&state).unwrap_or(StoryState::Idea),
        parent_story_id: row.get::<_, Option<String>>(5)?.map(StoryId::new),
        child_order: json_column(row, 6)?,
        team_members: json_column(row, 7)?,
        categories: json_column(row, 8)?,
        checklist: json_column(row, 9)?,
        review: review_from_row(row, 10)?,
        archived_at: opt_millis(row, 16)?,
        deleted_at: opt_millis(row, 17)?,
        created_by: UserId::new(row.get(18)?),
        created_at: millis(row, 19)?,
        updated_at: millis(row, 20)?,
    })
}

fn piece_from_row(row: &Row<'_>) -> rusqlite::Result<Piece> {
    let state: String = row.get(5)?;
    let previous_state: Option<String> = row.get(6)?;

    Ok(Piece {
        id: PieceId::new(row.get(0)?),
        workspace_id: WorkspaceId::new(row.get(1)?),
        linked_story_ids: Vec::new(), // filled in by the caller
        created_from_story_id: row.get::<_, Option<String>>(2)?.map(StoryId::new),
        format: row.get(3)?,
        headline: row.get(4)?,
        state: PieceState::from_str(&state).unwrap_or(PieceState::Scripting),
        previous_state: previous_state.and_then(|s| PieceState::from_str(&s)),
        current_script_version: row.get(7)?,
        review: review_from_row(row, 8)?,
        created_by: UserId::new(row.get(14)?),
        created_at: millis(row, 15)?,
        updated_at: millis(row, 16)?,
    })
}

const STORY_COLUMNS: &str = "id, workspace_id, headline, description, state, parent_story_id, \
     child_order, team_members, categories, checklist, \
     approved, approved_by, approved_at, rejected_at, rejection_reason, parked_until, \
     archived_at, deleted_at, created_by, created_at, updated_at";

const PIECE_COLUMNS: &str = "id, workspace_id, created_from_story_id, format, headline, state, \
     previous_state, current_script_version, \
     approved, approved_by, approved_at, rejected_at, rejection_reason, parked_until, \
     created_by, created_at, updated_at";

impl DeskSqlStore {
    // ===== Story operations =====

    /// Insert a new story
    pub fn create_story(&self, story: &Story) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO stories ({}) VALUES \
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                STORY_COLUMNS
            ),
            params![
                story.id.to_string(),
                story.workspace_id.to_string(),
                &story.headline,
                &story.description,
                story.state.as_str(),
                story.parent_story_id.as_ref().map(|id| id.to_string()),
                serde_json::to_string(&story.child_order)?,
                serde_json::to_string(&story.team_members)?,
                serde_json::to_string(&story.categories)?,
                serde_json::to_string(&story.checklist)?,
                story.review.approved as i64,
                story.review.approved_by.as_ref().map(|id| id.to_string()),
                story.review.approved_at.map(|t| t.as_millis() as i64),
                story.review.rejected_at.map(|t| t.as_millis() as i64),
                story.review.rejection_reason.as_deref(),
                story.review.parked_until.map(|t| t.as_millis() as i64),
                story.archived_at.map(|t| t.as_millis() as i64),
                story.deleted_at.map(|t| t.as_millis() as i64),
                story.created_by.to_string(),
                story.created_at.as_millis() as i64,
                story.updated_at.as_millis() as i64,
            ],
        )?;

        Ok(())
    }

    /// Get a story inside one workspace
    pub fn get_story(
        &self,
        workspace_id: &WorkspaceId,
        story_id: &StoryId,
    ) -> Result<Option<Story>, StoreError> {
        let conn = self.conn()?;

        let story = conn
            .query_row(
                &format!(
                    "SELECT {} FROM stories WHERE workspace_id = ? AND id = ?",
                    STORY_COLUMNS
                ),
                params![workspace_id.to_string(), story_id.to_string()],
                story_from_row,
            )
            .optional()?;

        Ok(story)
    }

    /// List every story in a workspace, oldest first
    pub fn list_stories(&self, workspace_id: &WorkspaceId) -> Result<Vec<Story>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM stories WHERE workspace_id = ? ORDER BY created_at, id",
            STORY_COLUMNS
        ))?;

        let stories = stmt
            .query_map(params![workspace_id.to_string()], story_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stories)
    }

    /// Update a story's mutable fields
    pub fn update_story(&self, story: &Story) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE stories SET
                headline = ?, description = ?, state = ?, parent_story_id = ?,
                child_order = ?, team_members = ?, categories = ?, checklist = ?,
                approved = ?, approved_by = ?, approved_at = ?,
                rejected_at = ?, rejection_reason = ?, parked_until = ?,
                archived_at = ?, deleted_at = ?, updated_at = ?
             WHERE workspace_id = ? AND id = ?",
            params![
                &story.headline,
                &story.description,
                story.state.as_str(),
                story.parent_story_id.as_ref().map(|id| id.to_string()),
                serde_json::to_string(&story.child_order)?,
                serde_json::to_string(&story.team_members)?,
                serde_json::to_string(&story.categories)?,
                serde_json::to_string(&story.checklist)?,
                story.review.approved as i64,
                story.review.approved_by.as_ref().map(|id| id.to_string()),
                story.review.approved_at.map(|t| t.as_millis() as i64),
                story.review.rejected_at.map(|t| t.as_millis() as i64),
                story.review.rejection_reason.as_deref(),
                story.review.parked_until.map(|t| t.as_millis() as i64),
                story.archived_at.map(|t| t.as_millis() as i64),
                story.deleted_at.map(|t| t.as_millis() as i64),
                story.updated_at.as_millis() as i64,
                story.workspace_id.to_string(),
                story.id.to_string(),
            ],
        )?;

        Ok(rows > 0)
    }

    /// Replace a package's child ordering in one transaction
    ///
    /// Validates workspace scope, single-parent membership, and acyclicity
    /// (a bounded ancestor walk) before writing; concurrent rewrites
    /// serialize on the immediate write lock, so two calls forming a mutual
    /// cycle cannot both pass validation.
    pub fn set_child_order_txn(
        &self,
        workspace_id: &WorkspaceId,
        parent_id: &StoryId,
        children: &[StoryId],
    ) -> Result<ChildOrderOutcome, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let parent: Option<(Option<String>, Option<i64>)> = tx
            .query_row(
                "SELECT parent_story_id, deleted_at FROM stories WHERE workspace_id = ? AND id = ?",
                params![workspace_id.to_string(), parent_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (parent_of_parent, parent_deleted) = match parent {
            Some(row) => row,
            None => return Ok(ChildOrderOutcome::ParentNotFound),
        };
        if parent_deleted.is_some() {
            return Ok(ChildOrderOutcome::ParentNotFound);
        }

        let new_children: HashSet<&StoryId> = children.iter().collect();

        // Every child must live in this workspace and not belong to a
        // different package already
        for child in children {
            if child == parent_id {
                return Ok(ChildOrderOutcome::Cycle);
            }

            let row: Option<(Option<String>, Option<i64>)> = tx
                .query_row(
                    "SELECT parent_story_id, deleted_at
                     FROM stories WHERE workspace_id = ? AND id = ?",
                    params![workspace_id.to_string(), child.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (child_parent, child_deleted) = match row {
                Some(row) => row,
                None => return Ok(ChildOrderOutcome::ChildNotFound),
            };
            if child_deleted.is_some() {
                return Ok(ChildOrderOutcome::ChildNotFound);
            }
            if let Some(existing_parent) = child_parent {
                if existing_parent != parent_id.0 {
                    return Ok(ChildOrderOutcome::ChildInAnotherPackage);
                }
            }
        }

        // A cycle forms exactly when a new child is the parent itself or one
        // of its ancestors; the walk is bounded by the workspace story count
        let story_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM stories WHERE workspace_id = ?",
            params![workspace_id.to_string()],
            |row| row.get(0),
        )?;

        let mut cursor = parent_of_parent;
        let mut steps: i64 = 0;
        while let Some(ancestor) = cursor {
            if new_children.contains(&StoryId::new(ancestor.clone())) {
                return Ok(ChildOrderOutcome::Cycle);
            }
            steps += 1;
            if steps > story_count {
                return Ok(ChildOrderOutcome::Cycle);
            }
            cursor = tx
                .query_row(
                    "SELECT parent_story_id FROM stories WHERE workspace_id = ? AND id = ?",
                    params![workspace_id.to_string(), ancestor],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
        }

        let now = Timestamp::now().as_millis() as i64;

        // Detach children dropped from the ordering
        let current_children: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM stories WHERE workspace_id = ? AND parent_story_id = ?",
            )?;
            let ids = stmt
                .query_map(
                    params![workspace_id.to_string(), parent_id.to_string()],
                    |row| row.get(0),
                )?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for current in current_children {
            if !new_children.contains(&StoryId::new(current.clone())) {
                tx.execute(
                    "UPDATE stories SET parent_story_id = NULL, updated_at = ?
                     WHERE workspace_id = ? AND id = ?",
                    params![now, workspace_id.to_string(), current],
                )?;
            }
        }

        // Attach the new children
        for child in children {
            tx.execute(
                "UPDATE stories SET parent_story_id = ?, updated_at = ?
                 WHERE workspace_id = ? AND id = ?",
                params![
                    parent_id.to_string(),
                    now,
                    workspace_id.to_string(),
                    child.to_string()
                ],
            )?;
        }

        tx.execute(
            "UPDATE stories SET child_order = ?, updated_at = ?
             WHERE workspace_id = ? AND id = ?",
            params![
                serde_json::to_string(children)?,
                now,
                workspace_id.to_string(),
                parent_id.to_string()
            ],
        )?;

        tx.commit()?;
        Ok(ChildOrderOutcome::Applied)
    }

    // ===== Piece operations =====

    /// Insert a new piece with its story links
    pub fn create_piece(&self, piece: &Piece) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            &format!(
                "INSERT INTO pieces ({}) VALUES \
                 (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PIECE_COLUMNS
            ),
            params![
                piece.id.to_string(),
                piece.workspace_id.to_string(),
                piece.created_from_story_id.as_ref().map(|id| id.to_string()),
                &piece.format,
                &piece.headline,
                piece.state.as_str(),
                piece.previous_state.map(|s| s.as_str()),
                piece.current_script_version,
                piece.review.approved as i64,
                piece.review.approved_by.as_ref().map(|id| id.to_string()),
                piece.review.approved_at.map(|t| t.as_millis() as i64),
                piece.review.rejected_at.map(|t| t.as_millis() as i64),
                piece.review.rejection_reason.as_deref(),
                piece.review.parked_until.map(|t| t.as_millis() as i64),
                piece.created_by.to_string(),
                piece.created_at.as_millis() as i64,
                piece.updated_at.as_millis() as i64,
            ],
        )?;

        Self::write_piece_links(&tx, piece)?;

        tx.commit()?;
        Ok(())
    }

    fn write_piece_links(tx: &Transaction<'_>, piece: &Piece) -> Result<(), StoreError> {
        tx.execute(
            "DELETE FROM piece_links WHERE piece_id = ?",
            params![piece.id.to_string()],
        )?;

        for (position, story_id) in piece.linked_story_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO piece_links (workspace_id, piece_id, story_id, position)
                 VALUES (?, ?, ?, ?)",
                params![
                    piece.workspace_id.to_string(),
                    piece.id.to_string(),
                    story_id.to_string(),
                    position as i64
                ],
            )?;
        }

        Ok(())
    }

    fn load_piece_links(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Vec<StoryId>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT story_id FROM piece_links
             WHERE workspace_id = ? AND piece_id = ? ORDER BY position",
        )?;

        let links = stmt
            .query_map(
                params![workspace_id.to_string(), piece_id.to_string()],
                |row| Ok(StoryId::new(row.get(0)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Get a piece inside one workspace
    pub fn get_piece(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Option<Piece>, StoreError> {
        let conn = self.conn()?;

        let piece = conn
            .query_row(
                &format!(
                    "SELECT {} FROM pieces WHERE workspace_id = ? AND id = ?",
                    PIECE_COLUMNS
                ),
                params![workspace_id.to_string(), piece_id.to_string()],
                piece_from_row,
            )
            .optional()?;
        drop(conn);

        match piece {
            Some(mut piece) => {
                piece.linked_story_ids = self.load_piece_links(workspace_id, &piece.id)?;
                Ok(Some(piece))
            }
            None => Ok(None),
        }
    }

    /// List every piece in a workspace, oldest first
    pub fn list_pieces(&self, workspace_id: &WorkspaceId) -> Result<Vec<Piece>, StoreError> {
        let pieces = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM pieces WHERE workspace_id = ? ORDER BY created_at, id",
                PIECE_COLUMNS
            ))?;

            let pieces = stmt
                .query_map(params![workspace_id.to_string()], piece_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            pieces
        };

        let mut out = Vec::with_capacity(pieces.len());
        for mut piece in pieces {
            piece.linked_story_ids = self.load_piece_links(workspace_id, &piece.id)?;
            out.push(piece);
        }

        Ok(out)
    }

    /// Update a piece's mutable fields and rewrite its links
    pub fn update_piece(&self, piece: &Piece) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE pieces SET
                created_from_story_id = ?, format = ?, headline = ?, state = ?,
                previous_state = ?, current_script_version = ?,
                approved = ?, approved_by = ?, approved_at = ?,
                rejected_at = ?, rejection_reason = ?, parked_until = ?, updated_at = ?
             WHERE workspace_id = ? AND id = ?",
            params![
                piece.created_from_story_id.as_ref().map(|id| id.to_string()),
                &piece.format,
                &piece.headline,
                piece.state.as_str(),
                piece.previous_state.map(|s| s.as_str()),
                piece.current_script_version,
                piece.review.approved as i64,
                piece.review.approved_by.as_ref().map(|id| id.to_string()),
                piece.review.approved_at.map(|t| t.as_millis() as i64),
                piece.review.rejected_at.map(|t| t.as_millis() as i64),
                piece.review.rejection_reason.as_deref(),
                piece.review.parked_until.map(|t| t.as_millis() as i64),
                piece.updated_at.as_millis() as i64,
                piece.workspace_id.to_string(),
                piece.id.to_string(),
            ],
        )?;

        if rows == 0 {
            return Ok(false);
        }

        Self::write_piece_links(&tx, piece)?;

        tx.commit()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_workflow::{ChecklistItem, TeamMember};

    fn setup() -> (DeskSqlStore, WorkspaceId, UserId) {
        let store = DeskSqlStore::memory().unwrap();
        let (workspace, owner) = crate::test_utils::seed_workspace(&store, "Newsroom");
        (store, workspace, owner)
    }

    fn make_story(workspace_id: &WorkspaceId, user: &UserId, headline: &str) -> Story {
        Story::new(
            workspace_id.clone(),
            headline.to_string(),
            String::new(),
            user.clone(),
        )
    }

    #[test]
    fn test_story_round_trip_with_json_fields() {
        let (store, workspace, user) = setup();
        let mut story = make_story(&workspace, &user, "Ferry strike");
        story.team_members = vec![TeamMember {
            user_id: user.clone(),
            role: "reporter".to_string(),
        }];
        story.categories = vec!["transport".to_string(), "labor".to_string()];
        story.checklist = vec![ChecklistItem {
            label: "confirm union statement".to_string(),
            done: false,
        }];

        store.create_story(&story).unwrap();
        let loaded = store.get_story(&workspace, &story.id).unwrap().unwrap();

        assert_eq!(loaded.headline, "Ferry strike");
        assert_eq!(loaded.team_members, story.team_members);
        assert_eq!(loaded.categories, story.categories);
        assert_eq!(loaded.checklist, story.checklist);
        assert!(loaded.review.is_pending());
    }

    #[test]
    fn test_story_not_visible_from_other_workspace() {
        let (store, workspace, user) = setup();
        let story = make_story(&workspace, &user, "Ferry strike");
        store.create_story(&story).unwrap();

        let other = WorkspaceId::generate();
        assert!(store.get_story(&other, &story.id).unwrap().is_none());
        assert!(store.list_stories(&other).unwrap().is_empty());
    }

    #[test]
    fn test_child_order_applied_and_parents_updated() {
        let (store, workspace, user) = setup();
        let parent = make_story(&workspace, &user, "Election package");
        let child_a = make_story(&workspace, &user, "Profile A");
        let child_b = make_story(&workspace, &user, "Profile B");
        store.create_story(&parent).unwrap();
        store.create_story(&child_a).unwrap();
        store.create_story(&child_b).unwrap();

        let outcome = store
            .set_child_order_txn(
                &workspace,
                &parent.id,
                &[child_a.id.clone(), child_b.id.clone()],
            )
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::Applied);

        let loaded = store.get_story(&workspace, &parent.id).unwrap().unwrap();
        assert_eq!(loaded.child_order, vec![child_a.id.clone(), child_b.id.clone()]);

        let a = store.get_story(&workspace, &child_a.id).unwrap().unwrap();
        assert_eq!(a.parent_story_id, Some(parent.id.clone()));

        // Dropping a child detaches it
        let outcome = store
            .set_child_order_txn(&workspace, &parent.id, &[child_b.id.clone()])
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::Applied);
        let a = store.get_story(&workspace, &child_a.id).unwrap().unwrap();
        assert!(a.parent_story_id.is_none());
    }

    #[test]
    fn test_child_order_rejects_cycles() {
        let (store, workspace, user) = setup();
        let grandparent = make_story(&workspace, &user, "Top");
        let parent = make_story(&workspace, &user, "Middle");
        let child = make_story(&workspace, &user, "Leaf");
        store.create_story(&grandparent).unwrap();
        store.create_story(&parent).unwrap();
        store.create_story(&child).unwrap();

        store
            .set_child_order_txn(&workspace, &grandparent.id, &[parent.id.clone()])
            .unwrap();
        store
            .set_child_order_txn(&workspace, &parent.id, &[child.id.clone()])
            .unwrap();

        // Leaf cannot adopt its grandparent
        let outcome = store
            .set_child_order_txn(&workspace, &child.id, &[grandparent.id.clone()])
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::Cycle);

        // A story cannot adopt itself
        let outcome = store
            .set_child_order_txn(&workspace, &child.id, &[child.id.clone()])
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::Cycle);
    }

    #[test]
    fn test_child_order_scope_and_single_parent() {
        let (store, workspace, user) = setup();
        let parent = make_story(&workspace, &user, "Package");
        let other_parent = make_story(&workspace, &user, "Other package");
        let child = make_story(&workspace, &user, "Child");
        store.create_story(&parent).unwrap();
        store.create_story(&other_parent).unwrap();
        store.create_story(&child).unwrap();

        // Foreign child id
        let outcome = store
            .set_child_order_txn(&workspace, &parent.id, &[StoryId::generate()])
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::ChildNotFound);

        // Child already under a different parent
        store
            .set_child_order_txn(&workspace, &parent.id, &[child.id.clone()])
            .unwrap();
        let outcome = store
            .set_child_order_txn(&workspace, &other_parent.id, &[child.id.clone()])
            .unwrap();
        assert_eq!(outcome, ChildOrderOutcome::ChildInAnotherPackage);
    }

    #[test]
    fn test_piece_round_trip_with_links() {
        let (store, workspace, user) = setup();
        let story_a = make_story(&workspace, &user, "A");
        let story_b = make_story(&workspace, &user, "B");
        store.create_story(&story_a).unwrap();
        store.create_story(&story_b).unwrap();

        let mut piece = Piece::new(
            workspace.clone(),
            "Explainer".to_string(),
            "video".to_string(),
            user.clone(),
        );
        piece.linked_story_ids = vec![story_b.id.clone(), story_a.id.clone()];
        store.create_piece(&piece).unwrap();

        let loaded = store.get_piece(&workspace, &piece.id).unwrap().unwrap();
        assert_eq!(loaded.format, "video");
        // Link order is preserved
        assert_eq!(
            loaded.linked_story_ids,
            vec![story_b.id.clone(), story_a.id.clone()]
        );
    }

    #[test]
    fn test_piece_state_persists() {
        let (store, workspace, user) = setup();
        let mut piece = Piece::new(
            workspace.clone(),
            "Explainer".to_string(),
            "video".to_string(),
            user,
        );
        store.create_piece(&piece).unwrap();

        piece.state = PieceState::Archived;
        piece.previous_state = Some(PieceState::Multimedia);
        assert!(store.update_piece(&piece).unwrap());

        let loaded = store.get_piece(&workspace, &piece.id).unwrap().unwrap();
        assert_eq!(loaded.state, PieceState::Archived);
        assert_eq!(loaded.previous_state, Some(PieceState::Multimedia));
    }

    #[test]
    fn test_update_missing_piece_reports_false() {
        let (store, workspace, user) = setup();
        let piece = Piece::new(
            workspace.clone(),
            "Explainer".to_string(),
            "video".to_string(),
            user,
        );

        assert!(!store.update_piece(&piece).unwrap());
    }
}
