use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

/// One logged set. Immutable once created, apart from deletion.
///
/// `exercise` holds the normalized catalog name; at write time it is
/// guaranteed to exist in the owning user's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: String,
    pub user_id: String,
    pub exercise: String,
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: i32,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for WorkoutRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            exercise: row.get("exercise")?,
            date: row.get("date")?,
            weight: row.get("weight")?,
            reps: row.get("reps")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Optional constraints for record queries. Date bounds are inclusive.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub exercise: Option<String>,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

/// One set in a progress series. Same-day sets are all present; collapsing
/// them is the caller's choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: i32,
}

/// Heaviest set of a day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyMax {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Record counts for the current and previous seven-day windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyComparison {
    pub this_week: i64,
    pub last_week: i64,
}
