//! Repository error taxonomy.
//!
//! # Invariants
//! - Engine errors are carried unchanged and exposed through `source()`.
//! - SQLite constraint failures are always `ConstraintViolation`, whichever
//!   conversion path they arrive through.

use crate::db::DbError;
use crate::model::entity::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// A single-row fetch or targeted update matched no row.
    NotFound {
        table: &'static str,
        id: Option<EntityId>,
    },
    /// Uniqueness, foreign key, not-null or check constraint failure.
    ConstraintViolation(rusqlite::Error),
    /// Any other engine failure.
    Db(DbError),
    /// Modifier input rejected before reaching SQLite.
    InvalidQuery(String),
    /// `page` or `limit` below 1.
    InvalidPagination { page: u32, limit: u32 },
    /// Delete without identifier or narrowing condition.
    MissingCondition(&'static str),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                table,
                id: Some(id),
            } => write!(f, "record not found in `{table}`: {id}"),
            Self::NotFound { table, id: None } => write!(f, "record not found in `{table}`"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::InvalidPagination { page, limit } => write!(
                f,
                "invalid pagination page={page} limit={limit}; both must be >= 1"
            ),
            Self::MissingCondition(table) => write!(
                f,
                "refusing to delete from `{table}` without identifier or condition"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidQuery(_) => None,
            Self::InvalidPagination { .. } => None,
            Self::MissingCondition(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_constraint_violation(&value) {
            Self::ConstraintViolation(value)
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::db::DbError;
    use std::error::Error;

    #[test]
    fn no_rows_stays_an_engine_error() {
        let err = RepoError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
        assert!(err.source().is_some());
    }

    #[test]
    fn not_found_message_names_table_and_id() {
        let err = RepoError::NotFound {
            table: "contacts",
            id: Some(7),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "record not found in `contacts`: 7");
    }

    #[test]
    fn global_errors_are_wrapped_as_db() {
        let err = RepoError::from(DbError::GlobalNotInstalled);
        assert!(matches!(err, RepoError::Db(DbError::GlobalNotInstalled)));
    }
}
