use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the persistence engine and its leaf components.
///
/// Driver errors are passed through unmodified via the `Sqlite` variant;
/// the engine never masks or retries them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row found for unique lookup")]
    NotPresent,

    #[error("query matched more than one row: {0}")]
    NonUnique(String),

    #[error("unknown table or unregistered entity type: {0}")]
    InvalidTable(String),

    #[error("unrecognized external field name: {0}")]
    InvalidTag(String),

    #[error("library path must be absolute: {0}")]
    NotAbs(PathBuf),

    #[error("column {column} holds a {expected} value, got {got}")]
    ColumnType {
        column: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
