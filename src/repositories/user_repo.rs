use chrono::Utc;
use rand_core::{OsRng, RngCore};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::models::{FromSqliteRow, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The active user of this name, created on first reference.
    ///
    /// The returned `User` is the context value callers thread into every
    /// catalog and record operation.
    pub fn get_or_create(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("User name must not be empty".to_string()));
        }

        if let Some(user) = self.find_by_name(name)? {
            return Ok(user);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            protection_code: generate_protection_code(),
            archived_at: None,
            created_at: Utc::now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, name, protection_code, archived_at, created_at)
             VALUES (?, ?, ?, NULL, ?)",
            rusqlite::params![user.id, user.name, user.protection_code, user.created_at],
        )?;

        tracing::info!("Created user {}", user.name);
        Ok(user)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM users WHERE name = ? AND archived_at IS NULL")?;
        let result = stmt.query_row([name.trim()], User::from_row).optional()?;
        Ok(result)
    }

    pub fn list(&self) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM users WHERE archived_at IS NULL ORDER BY name")?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn list_archived(&self) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare("SELECT * FROM users WHERE archived_at IS NOT NULL ORDER BY name, archived_at")?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Archive a user. Their rows stay in place but drop out of active
    /// listings and name lookups until restored.
    pub fn archive(&self, name: &str, protection_code: &str) -> Result<()> {
        let user = self
            .find_by_name(name)?
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", name.trim())))?;

        if user.protection_code != protection_code {
            return Err(Error::ProtectionCode);
        }

        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET archived_at = ? WHERE id = ?",
            rusqlite::params![Utc::now(), user.id],
        )?;

        tracing::info!("Archived user {}", user.name);
        Ok(())
    }

    /// Restore the most recently archived user of this name.
    pub fn restore(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if self.find_by_name(name)?.is_some() {
            return Err(Error::DuplicateUser(name.to_string()));
        }

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM users WHERE name = ? AND archived_at IS NOT NULL
             ORDER BY archived_at DESC LIMIT 1",
        )?;
        let user = stmt
            .query_row([name], User::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("No archived user: {name}")))?;

        conn.execute("UPDATE users SET archived_at = NULL WHERE id = ?", [&user.id])?;

        tracing::info!("Restored user {}", user.name);
        Ok(User {
            archived_at: None,
            ..user
        })
    }
}

/// Four digits, shown to the user once at creation.
fn generate_protection_code() -> String {
    let mut bytes = [0u8; 4];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| char::from(b'0' + b % 10)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    #[test]
    fn test_get_or_create_creates_once() {
        let repo = UserRepository::new(setup_test_db());

        let alice = repo.get_or_create("alice").unwrap();
        let again = repo.get_or_create("alice").unwrap();

        assert_eq!(alice.id, again.id);
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_create_trims_name() {
        let repo = UserRepository::new(setup_test_db());

        let user = repo.get_or_create("  alice  ").unwrap();
        assert_eq!(user.name, "alice");

        let found = repo.find_by_name("alice").unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn test_get_or_create_rejects_empty_name() {
        let repo = UserRepository::new(setup_test_db());

        let result = repo.get_or_create("   ");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_protection_code_is_four_digits() {
        let repo = UserRepository::new(setup_test_db());

        let user = repo.get_or_create("alice").unwrap();
        assert_eq!(user.protection_code.len(), 4);
        assert!(user.protection_code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_archive_requires_matching_code() {
        let repo = UserRepository::new(setup_test_db());
        let user = repo.get_or_create("alice").unwrap();

        let wrong = if user.protection_code == "0000" { "9999" } else { "0000" };
        let result = repo.archive("alice", wrong);
        assert!(matches!(result, Err(Error::ProtectionCode)));
        assert!(repo.find_by_name("alice").unwrap().is_some());

        repo.archive("alice", &user.protection_code).unwrap();
        assert!(repo.find_by_name("alice").unwrap().is_none());
        assert_eq!(repo.list_archived().unwrap().len(), 1);
    }

    #[test]
    fn test_archive_unknown_user() {
        let repo = UserRepository::new(setup_test_db());

        let result = repo.archive("nobody", "0000");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_restore_brings_user_back() {
        let repo = UserRepository::new(setup_test_db());
        let user = repo.get_or_create("alice").unwrap();
        repo.archive("alice", &user.protection_code).unwrap();

        let restored = repo.restore("alice").unwrap();

        assert_eq!(restored.id, user.id);
        assert!(!restored.is_archived());
        assert!(repo.find_by_name("alice").unwrap().is_some());
        assert!(repo.list_archived().unwrap().is_empty());
    }

    #[test]
    fn test_restore_without_archive() {
        let repo = UserRepository::new(setup_test_db());

        let result = repo.restore("alice");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_restore_conflicts_with_active_user() {
        let repo = UserRepository::new(setup_test_db());
        let first = repo.get_or_create("alice").unwrap();
        repo.archive("alice", &first.protection_code).unwrap();

        // A new profile may take over a freed name; restoring the archive
        // then has to fail.
        let second = repo.get_or_create("alice").unwrap();
        assert_ne!(first.id, second.id);

        let result = repo.restore("alice");
        assert!(matches!(result, Err(Error::DuplicateUser(_))));
    }
}
