//! Table-scoped SQL builder used as the "query in progress".
//!
//! # Responsibility
//! - Accumulate joins, filters, ordering, windowing and column omission.
//! - Render SELECT, COUNT and identifier-subquery statements with positional
//!   parameters in placeholder order.
//!
//! # Invariants
//! - Builder methods never fail; the first invalid input is recorded and
//!   surfaced by `error()` before execution.
//! - Parameters are emitted in SQL text order: joins, filters, limit, offset.
//! - COUNT statements ignore ordering, limit and offset.

use super::ident::{count_placeholders, has_comment, is_valid_identifier, qualify, quote};
use crate::model::entity::{Entity, EntityId};
use rusqlite::types::Value;

/// Sort direction for `Query::order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// SQL text plus positional parameters, ready for `rusqlite`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    sql: String,
    params: Vec<Value>,
}

/// Composable query scoped to one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: &'static str,
    id_column: &'static str,
    projection: Option<String>,
    distinct: bool,
    joins: Vec<Clause>,
    filters: Vec<Clause>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    omitted: Vec<String>,
    error: Option<String>,
}

impl Query {
    /// Creates an unfiltered query over `table`.
    pub fn new(table: &'static str, id_column: &'static str) -> Self {
        let mut query = Self {
            table,
            id_column,
            projection: None,
            distinct: false,
            joins: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            omitted: Vec::new(),
            error: None,
        };
        for name in [table, id_column] {
            if !is_valid_identifier(name) || name.contains('.') {
                query.reject(format!("invalid identifier `{name}`"));
            }
        }
        query
    }

    /// Base query for entity `T`.
    pub fn for_entity<T: Entity>() -> Self {
        Self::new(T::TABLE, T::ID_COLUMN)
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn id_column(&self) -> &'static str {
        self.id_column
    }

    /// First invalid builder input, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether anything narrows the row set beyond the bare table.
    pub fn has_conditions(&self) -> bool {
        !self.joins.is_empty()
            || !self.filters.is_empty()
            || self.limit.is_some()
            || self.offset.is_some()
    }

    pub fn is_omitted(&self, column: &str) -> bool {
        self.omitted.iter().any(|omitted| omitted == column)
    }

    /// Adds a raw boolean condition; `?` placeholders bind `params` in order.
    pub fn filter(
        mut self,
        sql: impl Into<String>,
        params: impl IntoIterator<Item = Value>,
    ) -> Self {
        let sql = sql.into();
        let params: Vec<Value> = params.into_iter().collect();
        if let Err(message) = check_placeholders(&sql, &params) {
            self.reject(message);
            return self;
        }
        self.filters.push(Clause { sql, params });
        self
    }

    /// Adds `column = value`, or `column IS NULL` for a null value.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        let Some(qualified) = self.qualified(column) else {
            return self.rejected_identifier(column);
        };
        match value.into() {
            Value::Null => self.filter(format!("{qualified} IS NULL"), Vec::new()),
            value => self.filter(format!("{qualified} = ?"), [value]),
        }
    }

    /// Adds `column IN (...)`; an empty set matches nothing.
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let Some(qualified) = self.qualified(column) else {
            return self.rejected_identifier(column);
        };
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return self.filter("1 = 0", Vec::new());
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.filter(format!("{qualified} IN ({placeholders})"), values)
    }

    /// Appends a raw join clause, e.g. `INNER JOIN tags ON tags.contact_id = contacts.id`.
    pub fn join(mut self, sql: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        let sql = sql.into();
        let params: Vec<Value> = params.into_iter().collect();
        if let Err(message) = check_placeholders(&sql, &params) {
            self.reject(message);
            return self;
        }
        self.joins.push(Clause { sql, params });
        self
    }

    /// Replaces the default `"table".*` projection.
    ///
    /// Only `BoundQuery::fetch_with` can decode arbitrary projections.
    pub fn select(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        let Some(qualified) = self.qualified(column) else {
            return self.rejected_identifier(column);
        };
        self.order_by.push(format!("{qualified} {}", order.as_sql()));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Excludes a column from INSERT/UPDATE statements.
    pub fn omit(mut self, column: &str) -> Self {
        if !is_valid_identifier(column) || column.contains('.') {
            return self.rejected_identifier(column);
        }
        if !self.is_omitted(column) {
            self.omitted.push(column.to_string());
        }
        self
    }

    /// Narrows to one identifier.
    pub fn with_id(self, id: EntityId) -> Self {
        let column = qualify(self.table, self.id_column);
        self.filter(format!("{column} = ?"), [Value::Integer(id)])
    }

    /// Single-row window used by identifier lookups; a caller offset still applies.
    pub(crate) fn single_row(mut self) -> Self {
        self.limit = Some(1);
        self
    }

    /// `SELECT [DISTINCT] <projection> FROM <table> ...` with ordering and window.
    pub fn to_select_sql(&self) -> RenderedSql {
        let projection = self
            .projection
            .clone()
            .unwrap_or_else(|| format!("{}.*", quote(self.table)));
        let head = format!(
            "SELECT {}{projection} FROM {}",
            self.distinct_keyword(),
            quote(self.table)
        );
        self.render(head, true)
    }

    /// `SELECT COUNT(...)` over the same joins and filters.
    pub fn to_count_sql(&self) -> RenderedSql {
        let head = if self.distinct {
            format!(
                "SELECT COUNT(DISTINCT {}) FROM {}",
                qualify(self.table, self.id_column),
                quote(self.table)
            )
        } else {
            format!("SELECT COUNT(*) FROM {}", quote(self.table))
        };
        self.render(head, false)
    }

    /// Identifier projection used to scope UPDATE/DELETE through joins and filters.
    pub(crate) fn to_id_subquery(&self) -> RenderedSql {
        let head = format!(
            "SELECT {}{} FROM {}",
            self.distinct_keyword(),
            qualify(self.table, self.id_column),
            quote(self.table)
        );
        self.render(head, true)
    }

    fn render(&self, head: String, windowed: bool) -> RenderedSql {
        let mut sql = head;
        let mut params = Vec::new();

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.sql);
            params.extend(join.params.iter().cloned());
        }

        if !self.filters.is_empty() {
            let conditions = self
                .filters
                .iter()
                .map(|clause| format!("({})", clause.sql))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
            for clause in &self.filters {
                params.extend(clause.params.iter().cloned());
            }
        }

        if windowed {
            if !self.order_by.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&self.order_by.join(", "));
            }
            match (self.limit, self.offset) {
                (Some(limit), Some(offset)) => {
                    sql.push_str(" LIMIT ? OFFSET ?");
                    params.push(to_integer(limit));
                    params.push(to_integer(offset));
                }
                (Some(limit), None) => {
                    sql.push_str(" LIMIT ?");
                    params.push(to_integer(limit));
                }
                (None, Some(offset)) => {
                    sql.push_str(" LIMIT -1 OFFSET ?");
                    params.push(to_integer(offset));
                }
                (None, None) => {}
            }
        }

        RenderedSql { sql, params }
    }

    fn distinct_keyword(&self) -> &'static str {
        if self.distinct {
            "DISTINCT "
        } else {
            ""
        }
    }

    fn qualified(&self, column: &str) -> Option<String> {
        is_valid_identifier(column).then(|| qualify(self.table, column))
    }

    fn rejected_identifier(mut self, column: &str) -> Self {
        self.reject(format!("invalid identifier `{column}`"));
        self
    }

    fn reject(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

fn check_placeholders(sql: &str, params: &[Value]) -> Result<(), String> {
    if has_comment(sql) {
        return Err(format!("clause `{sql}` contains an SQL comment"));
    }
    let expected = count_placeholders(sql);
    if expected == params.len() {
        return Ok(());
    }
    Err(format!(
        "clause `{sql}` has {expected} placeholder(s) but {} parameter(s)",
        params.len()
    ))
}

fn to_integer(value: u64) -> Value {
    Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
}
