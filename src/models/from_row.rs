use rusqlite::Row;

/// Construct a model from a SQLite row selected with `SELECT *`.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}
