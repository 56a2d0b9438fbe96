//! Whole-store JSON snapshots.
//!
//! A snapshot carries every user, archived ones included, with their
//! catalog and records, so restoring reproduces the store exactly.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{Exercise, FromSqliteRow, User, WorkoutRecord};

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub users: Vec<UserData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: User,
    pub exercises: Vec<Exercise>,
    pub records: Vec<WorkoutRecord>,
}

impl Snapshot {
    pub fn capture(pool: &DbPool) -> Result<Snapshot> {
        let conn = pool.get()?;

        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at")?;
        let users = stmt
            .query_map([], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut data = Vec::with_capacity(users.len());
        for user in users {
            let mut stmt =
                conn.prepare("SELECT * FROM exercises WHERE user_id = ? ORDER BY name")?;
            let exercises = stmt
                .query_map([&user.id], Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut stmt = conn.prepare(
                "SELECT * FROM workout_records WHERE user_id = ? ORDER BY date, rowid",
            )?;
            let records = stmt
                .query_map([&user.id], WorkoutRecord::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            data.push(UserData {
                user,
                exercises,
                records,
            });
        }

        Ok(Snapshot {
            created_at: Utc::now(),
            users: data,
        })
    }

    /// Replace the entire store contents with this snapshot, atomically.
    pub fn restore(&self, pool: &DbPool) -> Result<()> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM workout_records", [])?;
        tx.execute("DELETE FROM exercises", [])?;
        tx.execute("DELETE FROM users", [])?;

        for data in &self.users {
            let user = &data.user;
            tx.execute(
                "INSERT INTO users (id, name, protection_code, archived_at, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.protection_code,
                    user.archived_at,
                    user.created_at
                ],
            )?;

            for exercise in &data.exercises {
                tx.execute(
                    "INSERT INTO exercises (id, user_id, name, muscle_group, created_at)
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        exercise.id,
                        exercise.user_id,
                        exercise.name,
                        exercise.muscle_group,
                        exercise.created_at
                    ],
                )?;
            }

            for record in &data.records {
                tx.execute(
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
            }
        }

        tx.commit()?;

        tracing::info!("Restored {} users from snapshot", self.users.len());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Snapshot> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write `backup_<timestamp>.json` into `dir`, pruning the oldest backups
/// beyond `keep`. Timestamped names sort chronologically, so pruning works
/// on sorted file names.
pub fn write_backup_file(dir: &Path, snapshot: &Snapshot, keep: usize) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let filename = format!(
        "backup_{}.json",
        snapshot.created_at.format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);
    fs::write(&path, snapshot.to_json()?)?;

    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("backup_") && n.ends_with(".json"))
        })
        .collect();
    backups.sort();

    while backups.len() > keep {
        let oldest = backups.remove(0);
        tracing::debug!("Pruning old backup {}", oldest.display());
        fs::remove_file(oldest)?;
    }

    Ok(path)
}
