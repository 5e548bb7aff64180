//! On-disk and in-memory SQLite backing for the demo article store.
//!
//! # Responsibility
//! - Hand out connections whose `articles` schema is current.
//! - Refuse stores written by a newer build instead of guessing at their layout.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A connection is returned only after every pending migration committed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Parent directory of a file-backed store could not be created.
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The store was migrated by a build that knows more schema versions.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "article store query failed: {err}"),
            Self::CreateDir { path, source } => write!(
                f,
                "cannot create article store directory `{}`: {source}",
                path.display()
            ),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "article store uses schema v{found} but this build reads up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CreateDir { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
