use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// Muscle groups offered to pickers, sorted for display. The column itself
/// is free text.
pub const MUSCLE_GROUPS: &[&str] = &[
    "Arms",
    "Back",
    "Chest",
    "Core",
    "Full Body",
    "Legs",
    "Other",
    "Shoulders",
];

/// Group assigned to exercises created implicitly during import.
pub const DEFAULT_MUSCLE_GROUP: &str = "Other";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub muscle_group: String,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            muscle_group: row.get("muscle_group")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Canonical form of an exercise name: trimmed, inner whitespace collapsed,
/// lowercased. Stored names are already canonical, so equality on the
/// column doubles as case-insensitive uniqueness.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
