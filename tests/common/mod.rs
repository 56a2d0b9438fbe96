use chrono::NaiveDate;

use setlog::db::{create_memory_pool, DbPool};
use setlog::migrations::run_migrations_for_tests;
use setlog::models::User;
use setlog::repositories::{ExerciseRepository, RecordRepository, UserRepository};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_user(pool: &DbPool, name: &str) -> User {
    UserRepository::new(pool.clone())
        .get_or_create(name)
        .unwrap()
}

pub fn add_exercise(pool: &DbPool, user: &User, name: &str, muscle_group: &str) {
    ExerciseRepository::new(pool.clone())
        .create(&user.id, name, muscle_group)
        .unwrap();
}

pub fn log_set(pool: &DbPool, user: &User, exercise: &str, date: NaiveDate, weight: f64, reps: i32) {
    RecordRepository::new(pool.clone())
        .add(&user.id, exercise, date, weight, reps)
        .unwrap();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
