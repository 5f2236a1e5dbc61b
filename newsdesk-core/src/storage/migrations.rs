//! Database migrations for the newsdesk schema
//!
//! Versioned migrations applied atomically and tracked in the
//! desk_schema_version table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

use super::StoreError;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
    pub down_sql: Option<&'static str>,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial newsdesk schema",
        up_sql: r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS desk_schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- User accounts (never deleted, only soft-disabled)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role_hints TEXT NOT NULL DEFAULT '[]',      -- JSON array
                disabled INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );

            -- Workspaces (the tenant/isolation boundary)
            CREATE TABLE IF NOT EXISTS workspaces (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Workspace members (one role per user per workspace)
            CREATE TABLE IF NOT EXISTS workspace_members (
                workspace_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('viewer', 'editor', 'admin', 'owner')),
                joined_at INTEGER NOT NULL,
                invited_by TEXT,
                PRIMARY KEY (workspace_id, user_id),
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_members_user ON workspace_members(user_id);
            CREATE INDEX IF NOT EXISTS idx_members_role ON workspace_members(workspace_id, role);

            -- Join invites (at most one live per workspace)
            CREATE TABLE IF NOT EXISTS invites (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                token TEXT NOT NULL UNIQUE,
                issuer TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                consumed_at INTEGER,
                consumed_by TEXT,
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_invites_workspace ON invites(workspace_id);
            CREATE INDEX IF NOT EXISTS idx_invites_live
                ON invites(workspace_id)
                WHERE consumed_at IS NULL;

            -- Stories (editorial units; may group into parent packages)
            CREATE TABLE IF NOT EXISTS stories (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                headline TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL CHECK(state IN (
                    'idea', 'research', 'scripting', 'multimedia',
                    'finalization', 'published', 'archived'
                )),
                parent_story_id TEXT,
                child_order TEXT NOT NULL DEFAULT '[]',     -- JSON array of story ids
                team_members TEXT NOT NULL DEFAULT '[]',    -- JSON array
                categories TEXT NOT NULL DEFAULT '[]',      -- JSON array
                checklist TEXT NOT NULL DEFAULT '[]',       -- JSON array
                approved INTEGER NOT NULL DEFAULT 0,
                approved_by TEXT,
                approved_at INTEGER,
                rejected_at INTEGER,
                rejection_reason TEXT,
                parked_until INTEGER,
                archived_at INTEGER,
                deleted_at INTEGER,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_stories_workspace ON stories(workspace_id);
            CREATE INDEX IF NOT EXISTS idx_stories_parent
                ON stories(workspace_id, parent_story_id);

            -- Pieces (deliverables with their own board state)
            CREATE TABLE IF NOT EXISTS pieces (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                created_from_story_id TEXT,
                format TEXT NOT NULL,
                headline TEXT NOT NULL,
                state TEXT NOT NULL CHECK(state IN (
                    'scripting', 'multimedia', 'finalization', 'published', 'archived'
                )),
                previous_state TEXT,
                current_script_version INTEGER NOT NULL DEFAULT 1,
                approved INTEGER NOT NULL DEFAULT 0,
                approved_by TEXT,
                approved_at INTEGER,
                rejected_at INTEGER,
                rejection_reason TEXT,
                parked_until INTEGER,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_pieces_workspace ON pieces(workspace_id);
            CREATE INDEX IF NOT EXISTS idx_pieces_state ON pieces(workspace_id, state);

            -- Piece <-> story links (many-to-many)
            CREATE TABLE IF NOT EXISTS piece_links (
                workspace_id TEXT NOT NULL,
                piece_id TEXT NOT NULL,
                story_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (piece_id, story_id),
                FOREIGN KEY (piece_id) REFERENCES pieces(id) ON DELETE CASCADE,
                FOREIGN KEY (story_id) REFERENCES stories(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_piece_links_story
                ON piece_links(workspace_id, story_id);

            -- Fact-checks (flagged spans on stories/pieces)
            CREATE TABLE IF NOT EXISTS fact_checks (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                parent_kind TEXT NOT NULL CHECK(parent_kind IN ('story', 'piece')),
                parent_id TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('claim', 'question', 'source_needed')),
                sel_start INTEGER NOT NULL,
                sel_end INTEGER NOT NULL,
                sel_text TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('pending', 'verified', 'disputed')),
                note TEXT NOT NULL DEFAULT '',
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_checks_parent
                ON fact_checks(workspace_id, parent_kind, parent_id);
            CREATE INDEX IF NOT EXISTS idx_checks_status
                ON fact_checks(workspace_id, status);

            -- Fact-check comment threads (append-only)
            CREATE TABLE IF NOT EXISTS fact_check_comments (
                id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                fact_check_id TEXT NOT NULL,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE,
                FOREIGN KEY (fact_check_id) REFERENCES fact_checks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_comments_check
                ON fact_check_comments(fact_check_id);

            -- Append-only activity record
            CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id TEXT NOT NULL,
                story_id TEXT,
                piece_id TEXT,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                at INTEGER NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                FOREIGN KEY (workspace_id) REFERENCES workspaces(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_activity_story
                ON activity_log(workspace_id, story_id);
            CREATE INDEX IF NOT EXISTS idx_activity_piece
                ON activity_log(workspace_id, piece_id);
        "#,
        down_sql: Some(
            r#"
            DROP INDEX IF EXISTS idx_activity_piece;
            DROP INDEX IF EXISTS idx_activity_story;
            DROP TABLE IF EXISTS activity_log;

            DROP INDEX IF EXISTS idx_comments_check;
            DROP TABLE IF EXISTS fact_check_comments;

            DROP INDEX IF EXISTS idx_checks_status;
            DROP INDEX IF EXISTS idx_checks_parent;
            DROP TABLE IF EXISTS fact_checks;

            DROP INDEX IF EXISTS idx_piece_links_story;
            DROP TABLE IF EXISTS piece_links;

            DROP INDEX IF EXISTS idx_pieces_state;
            DROP INDEX IF EXISTS idx_pieces_workspace;
            DROP TABLE IF EXISTS pieces;

            DROP INDEX IF EXISTS idx_stories_parent;
            DROP INDEX IF EXISTS idx_stories_workspace;
            DROP TABLE IF EXISTS stories;

            DROP INDEX IF EXISTS idx_invites_live;
            DROP INDEX IF EXISTS idx_invites_workspace;
            DROP TABLE IF EXISTS invites;

            DROP INDEX IF EXISTS idx_members_role;
            DROP INDEX IF EXISTS idx_members_user;
            DROP TABLE IF EXISTS workspace_members;

            DROP TABLE IF EXISTS workspaces;
            DROP TABLE IF EXISTS users;
            DROP TABLE IF EXISTS desk_schema_version;
        "#,
        ),
    }]
}

/// Get current schema version from database
fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> Result<i32, StoreError> {
    let conn = pool.get()?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS desk_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Result<i32, _> = conn.query_row(
        "SELECT version FROM desk_schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), StoreError> {
    let current_version = get_current_version(pool)?;
    let migrations = get_migrations();

    let pending: Vec<_> = migrations
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let conn = pool.get()?;

    for migration in pending {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.up_sql)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as i64;

        tx.execute(
            "INSERT INTO desk_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;

        tx.commit()?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

/// Get the latest migration version available
pub fn get_latest_version() -> i32 {
    get_migrations().iter().map(|m| m.version).max().unwrap_or(0)
}
