use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("could not read tags from {path}: {detail}")]
    Tags { path: PathBuf, detail: String },

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error("duration probe failed for {path}: {detail}")]
    ProbeFailed { path: PathBuf, detail: String },

    #[error("probe output carries no duration for {0}")]
    NoDuration(PathBuf),

    #[error("library {0:?} has no filesystem root")]
    NoRoot(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
