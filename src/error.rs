use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Backup error: {0}")]
    Backup(#[from] serde_json::Error),

    #[error("Exercise already exists: {0}")]
    DuplicateExercise(String),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown exercise: {0}")]
    InvalidExercise(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Exercise {name} is still referenced by {records} logged records")]
    ExerciseInUse { name: String, records: i64 },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Incorrect protection code")]
    ProtectionCode,

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
