//! Activity log storage operations

use rusqlite::{params, types::Type, Row};

use super::{DeskSqlStore, StoreError};
use crate::core_activity::{ActivityEntry, NewActivity};
use crate::model::{PieceId, StoryId, Timestamp, UserId, WorkspaceId};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    let metadata: String = row.get(7)?;
    let metadata: serde_json::Value = serde_json::from_str(&metadata)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(ActivityEntry {
        id: row.get(0)?,
        workspace_id: WorkspaceId::new(row.get(1)?),
        story_id: row.get::<_, Option<String>>(2)?.map(StoryId::new),
        piece_id: row.get::<_, Option<String>>(3)?.map(PieceId::new),
        actor: UserId::new(row.get(4)?),
        action: row.get(5)?,
        at: Timestamp::from_millis(row.get::<_, i64>(6)?.max(0) as u64),
        metadata,
    })
}

const ACTIVITY_COLUMNS: &str = "id, workspace_id, story_id, piece_id, actor, action, at, metadata";

impl DeskSqlStore {
    /// Append one activity entry, returning its assigned id
    pub fn append_activity(&self, entry: &NewActivity, at: Timestamp) -> Result<i64, StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO activity_log (workspace_id, story_id, piece_id, actor, action, at, metadata)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.workspace_id.to_string(),
                entry.story_id.as_ref().map(|id| id.to_string()),
                entry.piece_id.as_ref().map(|id| id.to_string()),
                entry.actor.to_string(),
                &entry.action,
                at.as_millis() as i64,
                serde_json::to_string(&entry.metadata)?,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Entries about one story, in append order
    pub fn list_activity_for_story(
        &self,
        workspace_id: &WorkspaceId,
        story_id: &StoryId,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM activity_log
             WHERE workspace_id = ? AND story_id = ?
             ORDER BY at, id",
            ACTIVITY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(
                params![workspace_id.to_string(), story_id.to_string()],
                entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries about one piece, in append order
    pub fn list_activity_for_piece(
        &self,
        workspace_id: &WorkspaceId,
        piece_id: &PieceId,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM activity_log
             WHERE workspace_id = ? AND piece_id = ?
             ORDER BY at, id",
            ACTIVITY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(
                params![workspace_id.to_string(), piece_id.to_string()],
                entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let store = DeskSqlStore::memory().unwrap();
        let (workspace, actor) = crate::test_utils::seed_workspace(&store, "Newsroom");
        let story = StoryId::generate();

        let first = store
            .append_activity(
                &NewActivity::for_story(
                    workspace.clone(),
                    story.clone(),
                    actor.clone(),
                    "story.created",
                    serde_json::json!({}),
                ),
                Timestamp::from_millis(1000),
            )
            .unwrap();
        let second = store
            .append_activity(
                &NewActivity::for_story(
                    workspace.clone(),
                    story.clone(),
                    actor,
                    "story.approved",
                    serde_json::json!({}),
                ),
                Timestamp::from_millis(1000),
            )
            .unwrap();

        assert!(second > first);

        let entries = store.list_activity_for_story(&workspace, &story).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].id, second);
    }
}
