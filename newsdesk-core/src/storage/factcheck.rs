//! Fact-check and comment storage operations

use rusqlite::{params, OptionalExtension, Row};

use super::{DeskSqlStore, StoreError};
use crate::core_factcheck::{
    CheckComment, CheckParent, FactCheck, FactCheckKind, FactCheckStatus, TextSelection,
};
use crate::model::{CommentId, FactCheckId, PieceId, StoryId, Timestamp, UserId, WorkspaceId};

fn parent_columns(parent: &CheckParent) -> (&'static str, String) {
    match parent {
        CheckParent::Story(id) => ("story", id.to_string()),
        CheckParent::Piece(id) => ("piece", id.to_string()),
    }
}

fn check_from_row(row: &Row<'_>) -> rusqlite::Result<FactCheck> {
    let parent_kind: String = row.get(2)?;
    let parent_id: String = row.get(3)?;
    let parent = match parent_kind.as_str() {
        "story" => CheckParent::Story(StoryId::new(parent_id)),
        _ => CheckParent::Piece(PieceId::new(parent_id)),
    };

    let kind: String = row.get(4)?;
    let status: String = row.get(8)?;

    Ok(FactCheck {
        id: FactCheckId::new(row.get(0)?),
        workspace_id: WorkspaceId::new(row.get(1)?),
        parent,
        kind: FactCheckKind::from_str(&kind).unwrap_or(FactCheckKind::Claim),
        selection: TextSelection {
            start: row.get::<_, i64>(5)?.max(0) as u32,
            end: row.get::<_, i64>(6)?.max(0) as u32,
            text: row.get(7)?,
        },
        status: FactCheckStatus::from_str(&status).unwrap_or(FactCheckStatus::Pending),
        note: row.get(9)?,
        created_by: UserId::new(row.get(10)?),
        created_at: Timestamp::from_millis(row.get::<_, i64>(11)?.max(0) as u64),
        updated_at: Timestamp::from_millis(row.get::<_, i64>(12)?.max(0) as u64),
    })
}

const CHECK_COLUMNS: &str = "id, workspace_id, parent_kind, parent_id, kind, \
     sel_start, sel_end, sel_text, status, note, created_by, created_at, updated_at";

impl DeskSqlStore {
    /// Insert a new fact-check
    pub fn create_fact_check(&self, check: &FactCheck) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let (parent_kind, parent_id) = parent_columns(&check.parent);

        conn.execute(
            &format!(
                "INSERT INTO fact_checks ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                CHECK_COLUMNS
            ),
            params![
                check.id.to_string(),
                check.workspace_id.to_string(),
                parent_kind,
                parent_id,
                check.kind.as_str(),
                check.selection.start as i64,
                check.selection.end as i64,
                &check.selection.text,
                check.status.as_str(),
                &check.note,
                check.created_by.to_string(),
                check.created_at.as_millis() as i64,
                check.updated_at.as_millis() as i64,
            ],
        )?;

        Ok(())
    }

    /// Get a fact-check inside one workspace
    pub fn get_fact_check(
        &self,
        workspace_id: &WorkspaceId,
        check_id: &FactCheckId,
    ) -> Result<Option<FactCheck>, StoreError> {
        let conn = self.conn()?;

        let check = conn
            .query_row(
                &format!(
                    "SELECT {} FROM fact_checks WHERE workspace_id = ? AND id = ?",
                    CHECK_COLUMNS
                ),
                params![workspace_id.to_string(), check_id.to_string()],
                check_from_row,
            )
            .optional()?;

        Ok(check)
    }

    /// List fact-checks on one story or piece, oldest first
    pub fn list_fact_checks(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
    ) -> Result<Vec<FactCheck>, StoreError> {
        let conn = self.conn()?;
        let (parent_kind, parent_id) = parent_columns(parent);

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fact_checks
             WHERE workspace_id = ? AND parent_kind = ? AND parent_id = ?
             ORDER BY created_at, id",
            CHECK_COLUMNS
        ))?;

        let checks = stmt
            .query_map(
                params![workspace_id.to_string(), parent_kind, parent_id],
                check_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(checks)
    }

    /// Update a fact-check's status and note
    pub fn update_fact_check(&self, check: &FactCheck) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE fact_checks SET status = ?, note = ?, updated_at = ?
             WHERE workspace_id = ? AND id = ?",
            params![
                check.status.as_str(),
                &check.note,
                check.updated_at.as_millis() as i64,
                check.workspace_id.to_string(),
                check.id.to_string(),
            ],
        )?;

        Ok(rows > 0)
    }

    /// Count checks still open (pending or disputed) on one parent
    pub fn count_open_checks(
        &self,
        workspace_id: &WorkspaceId,
        parent: &CheckParent,
    ) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        let (parent_kind, parent_id) = parent_columns(parent);

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fact_checks
             WHERE workspace_id = ? AND parent_kind = ? AND parent_id = ?
               AND status IN ('pending', 'disputed')",
            params![workspace_id.to_string(), parent_kind, parent_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u32)
    }

    /// Append a comment to a fact-check thread
    pub fn add_check_comment(&self, comment: &CheckComment) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO fact_check_comments (id, workspace_id, fact_check_id, author, body, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                comment.id.to_string(),
                comment.workspace_id.to_string(),
                comment.fact_check_id.to_string(),
                comment.author.to_string(),
                &comment.body,
                comment.created_at.as_millis() as i64,
            ],
        )?;

        Ok(())
    }

    /// A fact-check's comment thread in append order
    pub fn list_check_comments(
        &self,
        workspace_id: &WorkspaceId,
        check_id: &FactCheckId,
    ) -> Result<Vec<CheckComment>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, fact_check_id, author, body, created_at
             FROM fact_check_comments
             WHERE workspace_id = ? AND fact_check_id = ?
             ORDER BY created_at, rowid",
        )?;

        let comments = stmt
            .query_map(
                params![workspace_id.to_string(), check_id.to_string()],
                |row| {
                    Ok(CheckComment {
                        id: CommentId::new(row.get(0)?),
                        workspace_id: WorkspaceId::new(row.get(1)?),
                        fact_check_id: FactCheckId::new(row.get(2)?),
                        author: UserId::new(row.get(3)?),
                        body: row.get(4)?,
                        created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DeskSqlStore, WorkspaceId, UserId) {
        let store = DeskSqlStore::memory().unwrap();
        let (workspace, owner) = crate::test_utils::seed_workspace(&store, "Newsroom");
        (store, workspace, owner)
    }

    fn make_check(workspace: &WorkspaceId, user: &UserId) -> FactCheck {
        FactCheck::new(
            workspace.clone(),
            CheckParent::Story(StoryId::generate()),
            FactCheckKind::Claim,
            TextSelection {
                start: 3,
                end: 17,
                text: "97 % of voters".to_string(),
            },
            "confirm with registrar".to_string(),
            user.clone(),
        )
    }

    #[test]
    fn test_check_round_trip() {
        let (store, workspace, user) = setup();
        let check = make_check(&workspace, &user);
        store.create_fact_check(&check).unwrap();

        let loaded = store.get_fact_check(&workspace, &check.id).unwrap().unwrap();
        assert_eq!(loaded.kind, FactCheckKind::Claim);
        assert_eq!(loaded.selection.text, "97 % of voters");
        assert_eq!(loaded.status, FactCheckStatus::Pending);
        assert_eq!(loaded.parent, check.parent);
    }

    #[test]
    fn test_check_invisible_from_other_workspace() {
        let (store, workspace, user) = setup();
        let check = make_check(&workspace, &user);
        store.create_fact_check(&check).unwrap();

        let other = WorkspaceId::generate();
        assert!(store.get_fact_check(&other, &check.id).unwrap().is_none());
    }

    #[test]
    fn test_open_check_count() {
        let (store, workspace, user) = setup();
        let parent = CheckParent::Story(StoryId::generate());

        let mut first = make_check(&workspace, &user);
        first.parent = parent.clone();
        let mut second = make_check(&workspace, &user);
        second.parent = parent.clone();
        store.create_fact_check(&first).unwrap();
        store.create_fact_check(&second).unwrap();

        assert_eq!(store.count_open_checks(&workspace, &parent).unwrap(), 2);

        first.status = FactCheckStatus::Verified;
        assert!(store.update_fact_check(&first).unwrap());
        assert_eq!(store.count_open_checks(&workspace, &parent).unwrap(), 1);
    }

    #[test]
    fn test_comment_thread_order() {
        let (store, workspace, user) = setup();
        let check = make_check(&workspace, &user);
        store.create_fact_check(&check).unwrap();

        for body in ["first", "second", "third"] {
            let comment = CheckComment::new(
                workspace.clone(),
                check.id.clone(),
                user.clone(),
                body.to_string(),
            );
            store.add_check_comment(&comment).unwrap();
        }

        let thread = store.list_check_comments(&workspace, &check.id).unwrap();
        let bodies: Vec<&str> = thread.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }
}
