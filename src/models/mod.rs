pub mod exercise;
pub mod from_row;
pub mod record;
pub mod user;

pub use exercise::{normalize_name, Exercise, DEFAULT_MUSCLE_GROUP, MUSCLE_GROUPS};
pub use from_row::FromSqliteRow;
pub use record::{DailyMax, ProgressPoint, RecordFilter, WeeklyComparison, WorkoutRecord};
pub use user::User;
