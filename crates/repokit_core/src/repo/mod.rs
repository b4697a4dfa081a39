//! Generic repository over SQLite.
//!
//! # Responsibility
//! - Define the entity-agnostic data access contract.
//! - Scope units of work to transactions with guaranteed release.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `ConstraintViolation`)
//!   alongside engine transport errors.
//! - No retries happen at this layer.

pub mod error;
mod generic_repo;
pub mod transaction;

pub use error::{RepoError, RepoResult};
pub use generic_repo::{Repository, SqliteRepository};
