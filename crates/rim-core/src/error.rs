//! Import error taxonomy.
//!
//! One variant per operator-facing failure class. Lock contention is not an
//! error: it is the `AlreadyRunning` outcome in [`crate::importer`].

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Bad invocation: the input file is missing or is a directory.
    /// Reported before the lock is taken; no transaction is opened.
    #[error("{0}")]
    Usage(String),

    /// The file does not look like `;`-delimited CSV.
    #[error("Incorrect file format")]
    Format,

    /// A row does not have exactly the two expected columns.
    #[error("Incorrect file format: line {0} does not have exactly two columns")]
    RowShape(u64),

    /// A row's path failed the shape check; the whole run rolls back.
    #[error("LINE: {line}. Invalid url: {path}")]
    InvalidPath { line: u64, path: String },

    /// Storage-layer failure inside the import transaction.
    #[error("Error in transaction. Please repeat import")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Storage(StoreError::Database(err))
    }
}
