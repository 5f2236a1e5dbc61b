//! User account storage operations

use rusqlite::{params, types::Type, OptionalExtension, Row};

use super::{DeskSqlStore, StoreError};
use crate::core_identity::User;
use crate::model::{Timestamp, UserId};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_hints: String = row.get(4)?;
    let role_hints: Vec<String> = serde_json::from_str(&role_hints)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        role_hints,
        disabled: row.get::<_, i64>(5)? != 0,
        created_at: Timestamp::from_millis(row.get::<_, i64>(6)?.max(0) as u64),
    })
}

const USER_COLUMNS: &str = "id, email, display_name, password_hash, role_hints, disabled, created_at";

impl DeskSqlStore {
    /// Insert a new user account
    pub fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (id, email, display_name, password_hash, role_hints, disabled, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                &user.email,
                &user.display_name,
                &user.password_hash,
                serde_json::to_string(&user.role_hints)?,
                user.disabled as i64,
                user.created_at.as_millis() as i64,
            ],
        )?;

        Ok(())
    }

    /// Get a user by id
    pub fn get_user(&self, user_id: &UserId) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![user_id.to_string()],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    /// Get a user by (normalized) email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![email],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    /// Flip a user's soft-disable flag
    pub fn set_user_disabled(&self, user_id: &UserId, disabled: bool) -> Result<bool, StoreError> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE users SET disabled = ? WHERE id = ?",
            params![disabled as i64, user_id.to_string()],
        )?;

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get_user() {
        let store = DeskSqlStore::memory().unwrap();
        let mut user = User::new(
            "alice@example.com".to_string(),
            "Alice".to_string(),
            "argon2-hash".to_string(),
        );
        user.role_hints = vec!["producer".to_string()];

        store.create_user(&user).unwrap();

        let by_id = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.role_hints, vec!["producer".to_string()]);

        let by_email = store.get_user_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn test_duplicate_email_violates_unique_constraint() {
        let store = DeskSqlStore::memory().unwrap();
        let first = User::new("a@b.co".to_string(), "A".to_string(), "h".to_string());
        let second = User::new("a@b.co".to_string(), "B".to_string(), "h".to_string());

        store.create_user(&first).unwrap();
        assert!(store.create_user(&second).is_err());
    }

    #[test]
    fn test_set_user_disabled() {
        let store = DeskSqlStore::memory().unwrap();
        let user = User::new("a@b.co".to_string(), "A".to_string(), "h".to_string());
        store.create_user(&user).unwrap();

        assert!(store.set_user_disabled(&user.id, true).unwrap());
        assert!(store.get_user(&user.id).unwrap().unwrap().disabled);

        assert!(!store.set_user_disabled(&UserId::generate(), true).unwrap());
    }
}
