//! Generic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, counting, existence and pagination for any `Entity`.
//! - Compose caller modifiers onto the entity's base query for every call.
//! - Keep SQL text inside the persistence boundary.
//!
//! # Invariants
//! - Each operation builds a fresh base query; modifiers never leak between calls.
//! - Writes return the stored row, so generated columns land in the caller's record.
//! - `update` targets the explicit identifier, ignoring the record's own id.
//! - Paginated listing runs count and fetch as two statements; concurrent
//!   writers may make `total` and `items` momentarily disagree.

use super::error::{RepoError, RepoResult};
use super::transaction::in_transaction;
use crate::model::entity::{Entity, EntityId};
use crate::model::pagination::{PageResult, Pagination};
use crate::query::ident::{is_valid_identifier, quote};
use crate::query::{
    apply_modifiers, count, ensure_valid, fetch_all, BoundQuery, Query, QueryModifier,
    RenderedSql,
};
use log::{debug, error, log, Level};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::marker::PhantomData;
use std::time::Instant;

/// Repository interface for one record type.
pub trait Repository<T: Entity> {
    /// Loads one record by identifier; `NotFound` when nothing matches.
    fn find_by_id(&self, id: EntityId, modifiers: &[QueryModifier<'_>]) -> RepoResult<T>;
    /// Loads every matching record; no implicit limit or order.
    fn find_all(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<Vec<T>>;
    /// Loads one page plus the unpaged total and page count.
    fn find_all_paginated(
        &self,
        pagination: &Pagination,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<PageResult<T>>;
    /// Inserts `record` and refreshes it with generated columns.
    fn create<'r>(&self, record: &'r mut T, modifiers: &[QueryModifier<'_>])
        -> RepoResult<&'r mut T>;
    /// Overwrites every non-omitted column of row `id` with `record`.
    fn update<'r>(
        &self,
        record: &'r mut T,
        id: EntityId,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<&'r mut T>;
    /// Updates by the record's own id, or creates when it has none.
    fn save<'r>(&self, record: &'r mut T, modifiers: &[QueryModifier<'_>])
        -> RepoResult<&'r mut T>;
    /// Deletes rows matching the record id and modifier conditions.
    fn delete(&self, record: &T, modifiers: &[QueryModifier<'_>]) -> RepoResult<()>;
    fn count(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<i64>;
    /// `count(modifiers) > 0`.
    fn exist(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<bool>;
    /// Returns the composed, unexecuted query.
    ///
    /// This is an escape hatch: the result exposes SQLite-specific types and
    /// ties the caller to this engine.
    fn query_builder(&self, modifiers: &[QueryModifier<'_>]) -> BoundQuery<'_>;
    /// Runs `tx_fn` against a repository bound to a new transaction.
    ///
    /// Commits when `tx_fn` returns `Ok`, rolls back when it returns `Err`
    /// or panics; a panic is resumed after rollback.
    fn with_transaction<R, E, F>(&self, tx_fn: F) -> Result<R, E>
    where
        Self: Sized,
        E: From<RepoError>,
        F: FnOnce(&SqliteRepository<'_, T>) -> Result<R, E>;
}

/// SQLite-backed generic repository.
pub struct SqliteRepository<'conn, T> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for SqliteRepository<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SqliteRepository<'_, T> {}

impl<'conn, T: Entity> SqliteRepository<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Handle this repository runs on; inside `with_transaction` it is the
    /// transactional handle, usable for repositories of other entity types.
    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn base_query(&self, modifiers: &[QueryModifier<'_>]) -> Query {
        apply_modifiers(Query::for_entity::<T>(), modifiers)
    }

    fn insert(&self, record: &mut T, query: &Query) -> RepoResult<()> {
        ensure_valid(query)?;
        let mut columns = Vec::new();
        let mut params = Vec::new();
        if let Some(id) = record.id() {
            columns.push(quote(T::ID_COLUMN));
            params.push(Value::Integer(id));
        }
        for (column, value) in write_set(record, query)? {
            columns.push(quote(column));
            params.push(value);
        }

        let table = quote(T::TABLE);
        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING *",
                columns.join(", ")
            )
        };

        *record = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| T::from_row(row))?;
        Ok(())
    }

    fn overwrite(&self, record: &mut T, id: EntityId, query: &Query) -> RepoResult<()> {
        ensure_valid(query)?;
        let assignments = write_set(record, query)?;
        if assignments.is_empty() {
            let scoped = query.clone().with_id(id).single_row();
            *record = fetch_all::<T>(self.conn, &scoped)?
                .into_iter()
                .next()
                .ok_or(RepoError::NotFound {
                    table: T::TABLE,
                    id: Some(id),
                })?;
            return Ok(());
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", quote(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut params: Vec<Value> = assignments.into_iter().map(|(_, value)| value).collect();
        let mut sql = format!(
            "UPDATE {} SET {set_clause} WHERE {} = ?",
            quote(T::TABLE),
            quote(T::ID_COLUMN)
        );
        params.push(Value::Integer(id));
        append_scope(&mut sql, &mut params, T::ID_COLUMN, query);
        sql.push_str(" RETURNING *");

        let stored = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| T::from_row(row))
            .optional()?;
        match stored {
            Some(stored) => {
                *record = stored;
                Ok(())
            }
            None => Err(RepoError::NotFound {
                table: T::TABLE,
                id: Some(id),
            }),
        }
    }

    fn remove(&self, record: &T, query: &Query) -> RepoResult<usize> {
        ensure_valid(query)?;
        let table = quote(T::TABLE);
        let (mut sql, mut params) = match record.id() {
            Some(id) => (
                format!("DELETE FROM {table} WHERE {} = ?", quote(T::ID_COLUMN)),
                vec![Value::Integer(id)],
            ),
            None if query.has_conditions() => (format!("DELETE FROM {table} WHERE 1 = 1"), Vec::new()),
            None => return Err(RepoError::MissingCondition(T::TABLE)),
        };
        append_scope(&mut sql, &mut params, T::ID_COLUMN, query);
        Ok(self.conn.execute(&sql, params_from_iter(params))?)
    }
}

impl<T: Entity> Repository<T> for SqliteRepository<'_, T> {
    fn find_by_id(&self, id: EntityId, modifiers: &[QueryModifier<'_>]) -> RepoResult<T> {
        let started_at = Instant::now();
        let query = self.base_query(modifiers).with_id(id).single_row();
        let result = fetch_all::<T>(self.conn, &query).and_then(|rows| {
            rows.into_iter().next().ok_or(RepoError::NotFound {
                table: T::TABLE,
                id: Some(id),
            })
        });
        observe("repo_find_by_id", Level::Debug, T::TABLE, started_at, result)
    }

    fn find_all(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<Vec<T>> {
        let started_at = Instant::now();
        let result = fetch_all::<T>(self.conn, &self.base_query(modifiers));
        observe("repo_find_all", Level::Debug, T::TABLE, started_at, result)
    }

    fn find_all_paginated(
        &self,
        pagination: &Pagination,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<PageResult<T>> {
        let started_at = Instant::now();
        let result = if pagination.is_valid() {
            let query = self.base_query(modifiers);
            count(self.conn, &query).and_then(|total| {
                let page_query = query
                    .limit(u64::from(pagination.limit))
                    .offset(pagination.offset());
                let items = fetch_all::<T>(self.conn, &page_query)?;
                Ok(PageResult {
                    items,
                    total,
                    max_page: pagination.max_page(total),
                })
            })
        } else {
            Err(RepoError::InvalidPagination {
                page: pagination.page,
                limit: pagination.limit,
            })
        };
        observe("repo_find_page", Level::Debug, T::TABLE, started_at, result)
    }

    fn create<'r>(
        &self,
        record: &'r mut T,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<&'r mut T> {
        let started_at = Instant::now();
        let result = self.insert(record, &self.base_query(modifiers));
        observe("repo_create", Level::Info, T::TABLE, started_at, result)?;
        Ok(record)
    }

    fn update<'r>(
        &self,
        record: &'r mut T,
        id: EntityId,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<&'r mut T> {
        let started_at = Instant::now();
        let result = self.overwrite(record, id, &self.base_query(modifiers));
        observe("repo_update", Level::Info, T::TABLE, started_at, result)?;
        Ok(record)
    }

    fn save<'r>(
        &self,
        record: &'r mut T,
        modifiers: &[QueryModifier<'_>],
    ) -> RepoResult<&'r mut T> {
        match record.id() {
            Some(id) => self.update(record, id, modifiers),
            None => self.create(record, modifiers),
        }
    }

    fn delete(&self, record: &T, modifiers: &[QueryModifier<'_>]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.remove(record, &self.base_query(modifiers));
        if let Ok(affected) = &result {
            debug!("event=repo_delete module=repo table={} affected={affected}", T::TABLE);
        }
        observe("repo_delete", Level::Info, T::TABLE, started_at, result).map(|_| ())
    }

    fn count(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<i64> {
        let started_at = Instant::now();
        let result = count(self.conn, &self.base_query(modifiers));
        observe("repo_count", Level::Debug, T::TABLE, started_at, result)
    }

    fn exist(&self, modifiers: &[QueryModifier<'_>]) -> RepoResult<bool> {
        Ok(self.count(modifiers)? > 0)
    }

    fn query_builder(&self, modifiers: &[QueryModifier<'_>]) -> BoundQuery<'_> {
        BoundQuery::new(self.conn, self.base_query(modifiers))
    }

    fn with_transaction<R, E, F>(&self, tx_fn: F) -> Result<R, E>
    where
        E: From<RepoError>,
        F: FnOnce(&SqliteRepository<'_, T>) -> Result<R, E>,
    {
        in_transaction(self.conn, |tx| tx_fn(&SqliteRepository::new(tx)))
    }
}

/// Pairs writable columns with record values, dropping omitted columns.
fn write_set<T: Entity>(record: &T, query: &Query) -> RepoResult<Vec<(&'static str, Value)>> {
    let values = record.values();
    if values.len() != T::COLUMNS.len() {
        return Err(RepoError::InvalidQuery(format!(
            "entity `{}` returned {} values for {} columns",
            T::TABLE,
            values.len(),
            T::COLUMNS.len()
        )));
    }
    if let Some(column) = T::COLUMNS
        .iter()
        .find(|column| !is_valid_identifier(column) || column.contains('.'))
    {
        return Err(RepoError::InvalidQuery(format!(
            "invalid identifier `{column}`"
        )));
    }

    Ok(T::COLUMNS
        .iter()
        .copied()
        .zip(values)
        .filter(|(column, _)| !query.is_omitted(column))
        .collect())
}

/// Narrows an UPDATE/DELETE to rows the composed query would select.
fn append_scope(sql: &mut String, params: &mut Vec<Value>, id_column: &str, query: &Query) {
    if !query.has_conditions() {
        return;
    }
    let RenderedSql {
        sql: subquery,
        params: subquery_params,
    } = query.to_id_subquery();
    sql.push_str(&format!(" AND {} IN ({subquery})", quote(id_column)));
    params.extend(subquery_params);
}

fn observe<R>(
    event: &str,
    level: Level,
    table: &str,
    started_at: Instant,
    result: RepoResult<R>,
) -> RepoResult<R> {
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => log!(
            level,
            "event={event} module=repo status=ok table={table} duration_ms={duration_ms}"
        ),
        Err(RepoError::NotFound { .. }) => debug!(
            "event={event} module=repo status=not_found table={table} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=repo status=error table={table} duration_ms={duration_ms} error={err}"
        ),
    }
    result
}
