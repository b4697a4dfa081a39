//! SQLite handle bootstrap and the optional process-wide handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections from `StoreConfig`.
//! - Hold the single global connection for implicit repository access.
//!
//! # Invariants
//! - Returned connections honor the configured `foreign_keys` and busy timeout.
//! - The global handle is installed at most once and never replaced.
//!
//! # See also
//! - `repo` for the operations that run on these handles.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod global;
mod open;

pub use open::{open_db, open_db_in_memory, open_store};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `global::install` was called after a handle was already installed.
    GlobalAlreadyInstalled,
    /// Global access was attempted before `global::install`.
    GlobalNotInstalled,
    /// Global access was attempted while this thread already holds the handle.
    GlobalReentered,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::GlobalAlreadyInstalled => {
                write!(f, "global store handle is already installed")
            }
            Self::GlobalNotInstalled => write!(f, "global store handle is not installed"),
            Self::GlobalReentered => {
                write!(f, "global store handle is already held by this thread")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::GlobalAlreadyInstalled => None,
            Self::GlobalNotInstalled => None,
            Self::GlobalReentered => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
