//! Import/export boundary: CSV exchange of a user's records and JSON
//! backups of the whole store.
//!
//! The exchange format is one record per row under the header
//! `user,exercise,muscle_group,date,weight,reps`, with ISO-8601 dates.
//! Import is skip-and-report: every row parses and validates on its own,
//! and a bad row never takes the rest of the file down with it.

pub mod backup;

use std::io::{Read, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::models::{User, WorkoutRecord, DEFAULT_MUSCLE_GROUP};
use crate::repositories::{ExerciseRepository, RecordRepository};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    user: &'a str,
    exercise: String,
    muscle_group: String,
    date: NaiveDate,
    weight: f64,
    reps: i32,
}

/// Incoming row. `user` and `muscle_group` may be absent; rows always land
/// in the importing user's log regardless of the `user` column.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    #[allow(dead_code)]
    user: Option<String>,
    exercise: String,
    #[serde(default)]
    muscle_group: Option<String>,
    date: NaiveDate,
    weight: f64,
    reps: i32,
}

/// Knobs for [`import_records`].
#[derive(Debug, Default, Clone)]
pub struct ImportOptions {
    /// Add unknown exercises to the catalog (under the row's muscle group,
    /// or "Other") instead of rejecting their rows.
    pub create_missing_exercises: bool,
}

/// A row that failed parsing or validation. `line` is the 1-based data row
/// number, not counting the header.
#[derive(Debug)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: Error,
}

/// Outcome of an import: what went in and which rows were turned away.
#[derive(Debug)]
pub struct ImportReport {
    pub imported: Vec<WorkoutRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Write all of the user's records to `writer` as CSV, date ascending.
/// Returns the number of exported rows.
pub fn export_records<W: Write>(pool: &DbPool, user: &User, writer: W) -> Result<usize> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT r.exercise, e.muscle_group, r.date, r.weight, r.reps
         FROM workout_records r
         LEFT JOIN exercises e ON e.user_id = r.user_id AND e.name = r.exercise
         WHERE r.user_id = ?
         ORDER BY r.date, r.rowid",
    )?;
    let rows = stmt
        .query_map([&user.id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, NaiveDate>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for (exercise, muscle_group, date, weight, reps) in rows {
        csv_writer.serialize(ExportRow {
            user: &user.name,
            exercise,
            muscle_group: muscle_group.unwrap_or_else(|| DEFAULT_MUSCLE_GROUP.to_string()),
            date,
            weight,
            reps,
        })?;
        written += 1;
    }
    csv_writer.flush()?;

    tracing::info!("Exported {} records for user {}", written, user.name);
    Ok(written)
}

/// Read CSV rows from `reader` into the user's record store.
///
/// Rows are processed independently: unparseable rows are reported as
/// `MalformedInput`, rows failing store validation carry the propagated
/// `InvalidExercise`/`InvalidQuantity`, and every valid row is persisted
/// no matter what came before it.
pub fn import_records<R: Read>(
    pool: &DbPool,
    user_id: &str,
    reader: R,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let exercises = ExerciseRepository::new(pool.clone());
    let records = RecordRepository::new(pool.clone());

    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut report = ImportReport {
        imported: Vec::new(),
        rejected: Vec::new(),
    };

    for (index, row) in csv_reader.deserialize::<ImportRow>().enumerate() {
        let line = index + 1;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                report.rejected.push(RejectedRow {
                    line,
                    reason: Error::MalformedInput(err.to_string()),
                });
                continue;
            }
        };

        if options.create_missing_exercises && exercises.find(user_id, &row.exercise)?.is_none() {
            let group = row.muscle_group.as_deref().unwrap_or(DEFAULT_MUSCLE_GROUP);
            match exercises.create(user_id, &row.exercise, group) {
                Ok(_) => {}
                // An unusable name (e.g. blank) rejects the row, not the file.
                Err(err @ Error::Validation(_)) => {
                    report.rejected.push(RejectedRow { line, reason: err });
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        match records.add(user_id, &row.exercise, row.date, row.weight, row.reps) {
            Ok(record) => report.imported.push(record),
            Err(err @ (Error::InvalidExercise(_) | Error::InvalidQuantity(_))) => {
                report.rejected.push(RejectedRow { line, reason: err });
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        "Imported {} records, rejected {} rows",
        report.imported.len(),
        report.rejected.len()
    );
    Ok(report)
}
