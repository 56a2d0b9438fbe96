use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// A profile owning a catalog and a set of workout records.
///
/// The protection code is handed out once at creation and must be repeated
/// to archive the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub protection_code: String,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            protection_code: row.get("protection_code")?,
            archived_at: row.get("archived_at")?,
            created_at: row.get("created_at")?,
        })
    }
}
