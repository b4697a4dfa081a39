//! Reusable query modifiers.
//!
//! Each constructor captures its inputs and returns an `Fn(Query) -> Query`
//! that can be passed to repository operations as `&scope`:
//!
//! ```ignore
//! let adults = scopes::filter("age >= ?", [Value::Integer(18)]);
//! let by_name = scopes::order_by("name", Order::Asc);
//! let rows = repo.find_all(&[&adults, &by_name])?;
//! ```

use super::builder::{Order, Query};
use rusqlite::types::Value;

pub fn where_eq(column: impl Into<String>, value: impl Into<Value>) -> impl Fn(Query) -> Query {
    let column = column.into();
    let value = value.into();
    move |query| query.where_eq(&column, value.clone())
}

pub fn where_in<I, V>(column: impl Into<String>, values: I) -> impl Fn(Query) -> Query
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let column = column.into();
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    move |query| query.where_in(&column, values.clone())
}

pub fn filter(
    sql: impl Into<String>,
    params: impl IntoIterator<Item = Value>,
) -> impl Fn(Query) -> Query {
    let sql = sql.into();
    let params: Vec<Value> = params.into_iter().collect();
    move |query| query.filter(sql.clone(), params.clone())
}

pub fn join(
    sql: impl Into<String>,
    params: impl IntoIterator<Item = Value>,
) -> impl Fn(Query) -> Query {
    let sql = sql.into();
    let params: Vec<Value> = params.into_iter().collect();
    move |query| query.join(sql.clone(), params.clone())
}

pub fn order_by(column: impl Into<String>, order: Order) -> impl Fn(Query) -> Query {
    let column = column.into();
    move |query| query.order_by(&column, order)
}

pub fn limit(limit: u64) -> impl Fn(Query) -> Query {
    move |query| query.limit(limit)
}

pub fn offset(offset: u64) -> impl Fn(Query) -> Query {
    move |query| query.offset(offset)
}

pub fn distinct() -> impl Fn(Query) -> Query {
    |query: Query| query.distinct()
}

pub fn omit(column: impl Into<String>) -> impl Fn(Query) -> Query {
    let column = column.into();
    move |query| query.omit(&column)
}
