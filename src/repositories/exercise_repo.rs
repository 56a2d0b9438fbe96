use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::models::{normalize_name, Exercise, FromSqliteRow};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add an exercise to the user's catalog. Names are stored in
    /// normalized form, so "Bench Press" and "bench press" collide.
    pub fn create(&self, user_id: &str, name: &str, muscle_group: &str) -> Result<Exercise> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(Error::Validation(
                "Exercise name must not be empty".to_string(),
            ));
        }

        if self.find(user_id, &name)?.is_some() {
            return Err(Error::DuplicateExercise(name));
        }

        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name,
            muscle_group: muscle_group.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
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

        tracing::debug!("Added exercise {} ({})", exercise.name, exercise.muscle_group);
        Ok(exercise)
    }

    pub fn find(&self, user_id: &str, name: &str) -> Result<Option<Exercise>> {
        let name = normalize_name(name);
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM exercises WHERE user_id = ? AND name = ?")?;
        let result = stmt
            .query_row([user_id, name.as_str()], Exercise::from_row)
            .optional()?;
        Ok(result)
    }

    /// The user's catalog ordered by name, optionally restricted to one
    /// muscle group.
    pub fn list(&self, user_id: &str, muscle_group: Option<&str>) -> Result<Vec<Exercise>> {
        let conn = self.pool.get()?;
        let exercises = match muscle_group {
            Some(group) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM exercises WHERE user_id = ? AND muscle_group = ? ORDER BY name",
                )?;
                let result = stmt
                    .query_map([user_id, group], Exercise::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                result
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT * FROM exercises WHERE user_id = ? ORDER BY name")?;
                let result = stmt
                    .query_map([user_id], Exercise::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                result
            }
        };
        Ok(exercises)
    }

    /// Reclassify an existing exercise.
    pub fn set_muscle_group(&self, user_id: &str, name: &str, muscle_group: &str) -> Result<Exercise> {
        let name = normalize_name(name);
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE exercises SET muscle_group = ? WHERE user_id = ? AND name = ?",
            rusqlite::params![muscle_group, user_id, name],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("Exercise not found: {name}")));
        }
        drop(conn);

        self.find(user_id, &name)?
            .ok_or_else(|| Error::NotFound(format!("Exercise not found: {name}")))
    }

    /// Remove a catalog entry. Refused while logged records still reference
    /// it, so queries never see a dangling exercise name.
    pub fn remove(&self, user_id: &str, name: &str) -> Result<()> {
        let name = normalize_name(name);
        let conn = self.pool.get()?;

        let records: i64 = conn.query_row(
            "SELECT COUNT(*) FROM workout_records WHERE user_id = ? AND exercise = ?",
            [user_id, name.as_str()],
            |row| row.get(0),
        )?;
        if records > 0 {
            return Err(Error::ExerciseInUse { name, records });
        }

        let rows = conn.execute(
            "DELETE FROM exercises WHERE user_id = ? AND name = ?",
            [user_id, name.as_str()],
        )?;
        if rows == 0 {
            return Err(Error::NotFound(format!("Exercise not found: {name}")));
        }

        tracing::debug!("Removed exercise {name}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;
    use crate::repositories::{RecordRepository, UserRepository};

    fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    fn create_test_user(pool: &DbPool, name: &str) -> String {
        UserRepository::new(pool.clone())
            .get_or_create(name)
            .unwrap()
            .id
    }

    #[test]
    fn test_create_exercise() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo.create(&user_id, "Bench Press", "Chest").unwrap();

        assert_eq!(exercise.name, "bench press");
        assert_eq!(exercise.muscle_group, "Chest");
        assert!(!exercise.id.is_empty());
    }

    #[test]
    fn test_create_duplicate_exercise() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        repo.create(&user_id, "Bench Press", "Chest").unwrap();
        let result = repo.create(&user_id, "Bench Press", "Chest");

        assert!(matches!(result, Err(Error::DuplicateExercise(_))));
        assert_eq!(repo.list(&user_id, None).unwrap().len(), 1);
    }

    #[test]
    fn test_uniqueness_is_case_insensitive() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        repo.create(&user_id, "Bench Press", "Chest").unwrap();
        let result = repo.create(&user_id, "  bench   PRESS ", "Chest");

        assert!(matches!(result, Err(Error::DuplicateExercise(_))));
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        let result = repo.create(&user_id, "   ", "Chest");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_catalogs_are_per_user() {
        let pool = setup_test_db();
        let alice = create_test_user(&pool, "alice");
        let bob = create_test_user(&pool, "bob");
        let repo = ExerciseRepository::new(pool);

        repo.create(&alice, "Bench Press", "Chest").unwrap();
        repo.create(&alice, "Squat", "Legs").unwrap();
        repo.create(&bob, "Deadlift", "Back").unwrap();

        assert_eq!(repo.list(&alice, None).unwrap().len(), 2);
        assert_eq!(repo.list(&bob, None).unwrap().len(), 1);
        assert!(repo.find(&bob, "Bench Press").unwrap().is_none());
    }

    #[test]
    fn test_list_ordered_and_filtered() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        repo.create(&user_id, "Squat", "Legs").unwrap();
        repo.create(&user_id, "Bench Press", "Chest").unwrap();
        repo.create(&user_id, "Leg Press", "Legs").unwrap();

        let all = repo.list(&user_id, None).unwrap();
        let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["bench press", "leg press", "squat"]);

        let legs = repo.list(&user_id, Some("Legs")).unwrap();
        let names: Vec<_> = legs.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["leg press", "squat"]);
    }

    #[test]
    fn test_set_muscle_group() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        repo.create(&user_id, "Deadlift", "Other").unwrap();
        let updated = repo.set_muscle_group(&user_id, "Deadlift", "Back").unwrap();

        assert_eq!(updated.muscle_group, "Back");
    }

    #[test]
    fn test_set_muscle_group_not_found() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        let result = repo.set_muscle_group(&user_id, "Deadlift", "Back");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_exercise() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        repo.create(&user_id, "Bench Press", "Chest").unwrap();
        repo.remove(&user_id, "bench press").unwrap();

        assert!(repo.find(&user_id, "Bench Press").unwrap().is_none());
    }

    #[test]
    fn test_remove_missing_exercise() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool);

        let result = repo.remove(&user_id, "Bench Press");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_referenced_exercise() {
        let pool = setup_test_db();
        let user_id = create_test_user(&pool, "alice");
        let repo = ExerciseRepository::new(pool.clone());
        let records = RecordRepository::new(pool);

        repo.create(&user_id, "Squat", "Legs").unwrap();
        records
            .add(
                &user_id,
                "Squat",
                chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                100.0,
                5,
            )
            .unwrap();

        let result = repo.remove(&user_id, "Squat");
        assert!(matches!(
            result,
            Err(Error::ExerciseInUse { records: 1, .. })
        ));
        assert!(repo.find(&user_id, "Squat").unwrap().is_some());
    }
}
