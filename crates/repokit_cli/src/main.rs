//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise every `repokit_core` repository operation on an in-memory store.
//! - Keep output deterministic for quick local sanity checks.

use repokit_core::{
    open_store, scopes, Entity, EntityId, Order, Pagination, RepoError, Repository,
    SqliteRepository, StoreConfig,
};
use rusqlite::types::Value;
use rusqlite::Row;
use std::process::ExitCode;

const SCHEMA: &str = "CREATE TABLE books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    year INTEGER
);";

#[derive(Debug, Clone)]
struct Book {
    id: Option<EntityId>,
    title: String,
    year: Option<i64>,
}

impl Book {
    fn new(title: &str, year: i64) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            year: Some(year),
        }
    }
}

impl Entity for Book {
    const TABLE: &'static str = "books";
    const COLUMNS: &'static [&'static str] = &["title", "year"];

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            self.year.map_or(Value::Null, Value::Integer),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            year: row.get("year")?,
        })
    }
}

fn main() -> ExitCode {
    println!("repokit_core version={}", repokit_core::core_version());
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("repokit smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RepoError> {
    let conn = open_store(&StoreConfig::in_memory())?;
    conn.execute_batch(SCHEMA)?;
    let books = SqliteRepository::<Book>::new(&conn);

    books.with_transaction(|tx| {
        for (title, year) in [("Dune", 1965), ("Neuromancer", 1984), ("Hyperion", 1989)] {
            tx.create(&mut Book::new(title, year), &[])?;
        }
        Ok::<_, RepoError>(())
    })?;
    println!("count={}", books.count(&[])?);

    let eighties = scopes::filter("year >= ?", [Value::Integer(1980)]);
    let by_title = scopes::order_by("title", Order::Asc);
    let page = books.find_all_paginated(&Pagination::new(1, 1), &[&eighties, &by_title])?;
    let first_title = page.items.first().map_or("-", |book| book.title.as_str());
    println!(
        "page=1 total={} max_page={} first={first_title}",
        page.total, page.max_page
    );

    let mut dune = books.find_by_id(1, &[])?;
    dune.year = None;
    books.update(&mut dune, 1, &[])?;
    println!("updated id=1 year={:?}", dune.year);

    books.delete(&dune, &[])?;
    println!(
        "deleted id=1 exists={}",
        books.exist(&[&scopes::where_eq("id", 1_i64)])?
    );

    let titles: Vec<String> = books
        .find_all(&[&by_title])?
        .into_iter()
        .map(|book| book.title)
        .collect();
    println!("remaining={}", titles.join(","));
    Ok(())
}
