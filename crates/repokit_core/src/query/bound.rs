//! Query bound to a live SQLite handle.
//!
//! # Responsibility
//! - Execute rendered `Query` statements against one connection.
//! - Back the repository's `query_builder` escape hatch.
//!
//! # Invariants
//! - A query carrying a builder error never reaches SQLite.
//! - `BoundQuery` exposes `rusqlite` types directly; code using it is tied
//!   to SQLite and bypasses the entity-agnostic repository surface.

use super::builder::{Query, RenderedSql};
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params_from_iter, Connection, Row};

/// Composed, not-yet-executed query plus the handle it will run on.
pub struct BoundQuery<'conn> {
    conn: &'conn Connection,
    query: Query,
}

impl<'conn> BoundQuery<'conn> {
    pub fn new(conn: &'conn Connection, query: Query) -> Self {
        Self { conn, query }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn into_query(self) -> Query {
        self.query
    }

    /// Chains one more modification onto the composed query.
    pub fn modify(self, modifier: impl FnOnce(Query) -> Query) -> Self {
        Self {
            conn: self.conn,
            query: modifier(self.query),
        }
    }

    pub fn fetch_all<T: Entity>(&self) -> RepoResult<Vec<T>> {
        fetch_all(self.conn, &self.query)
    }

    /// First row of the composed query, `NotFound` when empty.
    pub fn fetch_one<T: Entity>(&self) -> RepoResult<T> {
        let query = self.query.clone().single_row();
        fetch_all::<T>(self.conn, &query)?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound {
                table: self.query.table(),
                id: None,
            })
    }

    /// Runs the query and maps each row with `mapper`; pairs with `Query::select`.
    pub fn fetch_with<R, F>(&self, mapper: F) -> RepoResult<Vec<R>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<R>,
    {
        ensure_valid(&self.query)?;
        let RenderedSql { sql, params } = self.query.to_select_sql();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), mapper)?;
        Ok(rows.collect::<rusqlite::Result<Vec<R>>>()?)
    }

    pub fn count(&self) -> RepoResult<i64> {
        count(self.conn, &self.query)
    }
}

pub(crate) fn ensure_valid(query: &Query) -> RepoResult<()> {
    match query.error() {
        Some(message) => Err(RepoError::InvalidQuery(message.to_string())),
        None => Ok(()),
    }
}

pub(crate) fn fetch_all<T: Entity>(conn: &Connection, query: &Query) -> RepoResult<Vec<T>> {
    ensure_valid(query)?;
    let RenderedSql { sql, params } = query.to_select_sql();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), |row| T::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

pub(crate) fn count(conn: &Connection, query: &Query) -> RepoResult<i64> {
    ensure_valid(query)?;
    let RenderedSql { sql, params } = query.to_count_sql();
    let total = conn.query_row(&sql, params_from_iter(params), |row| row.get::<_, i64>(0))?;
    Ok(total)
}
