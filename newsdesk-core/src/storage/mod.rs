//! SQL-based storage for the newsdesk core
//!
//! One pooled SQLite database holds every table; each workspace-scoped table
//! carries a `workspace_id` column and every scoped query filters on it, so
//! cross-workspace reads are impossible at the query layer. The three
//! race-sensitive operations (guarded role writes, invite consumption, and
//! child-order rewrites) run inside `IMMEDIATE` transactions so their
//! validation and write are one atomic unit.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

use crate::config::StoreConfig;

mod activity;
mod factcheck;
mod identity;
pub mod migrations;
mod workflow;
mod workspace;

pub use workflow::ChildOrderOutcome;
pub use workspace::{MemberWriteOutcome, RedeemOutcome};

/// Storage-layer failures
///
/// These are infrastructure faults; domain outcomes (not-found, conflicts)
/// are expressed by the operations' return types instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Data encoding error: {0}")]
    Encoding(String),
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Pool(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encoding(e.to_string())
    }
}

/// Pooled SQLite store shared by every newsdesk component
#[derive(Clone)]
pub struct DeskSqlStore {
    pool: Pool<SqliteConnectionManager>,
}

impl DeskSqlStore {
    /// Create a store over an existing connection pool, running migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open (or create) the database described by the store configuration
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| StoreError::Pool(format!("Failed to create data dir: {}", e)))?;

        let db_path = config.data_dir.join(&config.db_file);
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::new(manager)?;

        Self::new(pool)
    }

    /// Create an in-memory store (for tests)
    ///
    /// The pool is capped at one connection so every caller sees the same
    /// in-memory database.
    pub fn memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;

        Self::new(pool)
    }

    /// Check out a pooled connection
    pub(crate) fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_migrates() {
        let store = DeskSqlStore::memory().unwrap();
        let conn = store.conn().unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for table in [
            "users",
            "workspaces",
            "workspace_members",
            "invites",
            "stories",
            "pieces",
            "piece_links",
            "fact_checks",
            "fact_check_comments",
            "activity_log",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_open_on_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().to_path_buf(),
            db_file: "test.db".to_string(),
        };

        {
            let store = DeskSqlStore::open(&config).unwrap();
            let user = crate::core_identity::User::new(
                "alice@example.com".to_string(),
                "Alice".to_string(),
                "hash".to_string(),
            );
            store.create_user(&user).unwrap();
        }

        // Reopen and read back
        let store = DeskSqlStore::open(&config).unwrap();
        let found = store.get_user_by_email("alice@example.com").unwrap();
        assert!(found.is_some());
    }
}
