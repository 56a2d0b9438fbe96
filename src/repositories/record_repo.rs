use chrono::{Duration, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::models::{
    normalize_name, DailyMax, FromSqliteRow, ProgressPoint, RecordFilter, WeeklyComparison,
    WorkoutRecord,
};

#[derive(Clone)]
pub struct RecordRepository {
    pool: DbPool,
}

impl RecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append one logged set. The exercise must already exist in the
    /// user's catalog; weight and reps must be positive. Nothing is
    /// persisted on failure.
    pub fn add(
        &self,
        user_id: &str,
        exercise_name: &str,
        date: NaiveDate,
        weight: f64,
        reps: i32,
    ) -> Result<WorkoutRecord> {
        if weight <= 0.0 {
            return Err(Error::InvalidQuantity(format!(
                "weight must be positive, got {weight}"
            )));
        }
        if reps <= 0 {
            return Err(Error::InvalidQuantity(format!(
                "reps must be positive, got {reps}"
            )));
        }

        let exercise = normalize_name(exercise_name);
        let conn = self.pool.get()?;

        let known: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM exercises WHERE user_id = ? AND name = ?",
            [user_id, exercise.as_str()],
            |row| row.get(0),
        )?;
        if !known {
            return Err(Error::InvalidExercise(exercise));
        }

        let record = WorkoutRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exercise,
            date,
            weight,
            reps,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO workout_records (id, user_id, exercise, date, weight, reps, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                record.id,
                record.user_id,
                record.exercise,
                record.date,
                record.weight,
                record.reps,
                record.created_at
            ],
        )?;

        tracing::debug!(
            "Logged {} {}x{} on {}",
            record.exercise,
            record.weight,
            record.reps,
            record.date
        );
        Ok(record)
    }

    /// Records matching the filter, date ascending with insertion order as
    /// tiebreak. No match is an empty list, not an error.
    pub fn query(&self, user_id: &str, filter: &RecordFilter) -> Result<Vec<WorkoutRecord>> {
        let mut sql = String::from("SELECT * FROM workout_records WHERE user_id = ?");
        let mut params: Vec<Value> = vec![Value::from(user_id.to_string())];

        if let Some(exercise) = &filter.exercise {
            sql.push_str(" AND exercise = ?");
            params.push(Value::from(normalize_name(exercise)));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND date >= ?");
            params.push(Value::from(from.to_string()));
        }
        if let Some(until) = filter.until {
            sql.push_str(" AND date <= ?");
            params.push(Value::from(until.to_string()));
        }
        sql.push_str(" ORDER BY date, rowid");

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(params), WorkoutRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn delete(&self, user_id: &str, record_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM workout_records WHERE id = ? AND user_id = ?",
            [record_id, user_id],
        )?;
        Ok(rows > 0)
    }

    /// Every logged set for one exercise in chronological order. Same-day
    /// sets all appear; collapsing them is left to the caller.
    pub fn progress_series(&self, user_id: &str, exercise_name: &str) -> Result<Vec<ProgressPoint>> {
        let exercise = normalize_name(exercise_name);
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT date, weight, reps FROM workout_records
             WHERE user_id = ? AND exercise = ? ORDER BY date, rowid",
        )?;
        let points = stmt
            .query_map([user_id, exercise.as_str()], |row| {
                Ok(ProgressPoint {
                    date: row.get(0)?,
                    weight: row.get(1)?,
                    reps: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(points)
    }

    /// Heaviest set per day for one exercise.
    pub fn daily_max_series(&self, user_id: &str, exercise_name: &str) -> Result<Vec<DailyMax>> {
        let exercise = normalize_name(exercise_name);
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT date, MAX(weight) FROM workout_records
             WHERE user_id = ? AND exercise = ? GROUP BY date ORDER BY date",
        )?;
        let series = stmt
            .query_map([user_id, exercise.as_str()], |row| {
                Ok(DailyMax {
                    date: row.get(0)?,
                    weight: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(series)
    }

    /// Most recent set for an exercise, if any. Entry forms use this to
    /// prefill weight and reps.
    pub fn last_for_exercise(
        &self,
        user_id: &str,
        exercise_name: &str,
    ) -> Result<Option<WorkoutRecord>> {
        let exercise = normalize_name(exercise_name);
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM workout_records
             WHERE user_id = ? AND exercise = ? ORDER BY date DESC, rowid DESC LIMIT 1",
        )?;
        let result = stmt
            .query_row([user_id, exercise.as_str()], WorkoutRecord::from_row)
            .optional()?;
        Ok(result)
    }

    pub fn count_between(&self, user_id: &str, from: NaiveDate, until: NaiveDate) -> Result<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM workout_records WHERE user_id = ? AND date >= ? AND date <= ?",
            rusqlite::params![user_id, from, until],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Records logged in the seven days ending today versus the seven days
    /// before that.
    pub fn weekly_comparison(&self, user_id: &str, today: NaiveDate) -> Result<WeeklyComparison> {
        Ok(WeeklyComparison {
            this_week: self.count_between(user_id, today - Duration::days(6), today)?,
            last_week: self.count_between(
                user_id,
                today - Duration::days(13),
                today - Duration::days(7),
            )?,
        })
    }
}
