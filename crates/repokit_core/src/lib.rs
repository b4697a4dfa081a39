//! Generic repository facade over SQLite.
//! One `SqliteRepository<T>` gives any `Entity` CRUD, counting, paging and
//! transaction scoping, shaped per call by composable query modifiers.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use config::{LoggingConfig, StoreConfig};
pub use db::{open_db, open_db_in_memory, open_store, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Entity, EntityId};
pub use model::pagination::{PageResult, Pagination};
pub use query::{apply_modifiers, scopes, BoundQuery, Order, Query, QueryModifier};
pub use repo::transaction::in_transaction;
pub use repo::{RepoError, RepoResult, Repository, SqliteRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
