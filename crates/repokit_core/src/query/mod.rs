//! Query composition over a table-scoped base query.
//!
//! # Responsibility
//! - Model the engine query (`Query`) and caller-supplied modifiers.
//! - Compose modifiers left to right onto a base query.
//! - Execute composed queries for the repository and the escape hatch.
//!
//! # Invariants
//! - Modifier order is caller-determined and preserved.
//! - Zero modifiers leave the base query unchanged.

mod bound;
mod builder;
pub mod ident;
pub mod scopes;

pub(crate) use bound::{count, ensure_valid, fetch_all};
pub use bound::BoundQuery;
pub use builder::{Order, Query, RenderedSql};

/// One composable transformation of the query in progress.
pub type QueryModifier<'m> = &'m dyn Fn(Query) -> Query;

/// Applies `modifiers` in order, each receiving the previous output.
pub fn apply_modifiers(query: Query, modifiers: &[QueryModifier<'_>]) -> Query {
    modifiers
        .iter()
        .fold(query, |query, modifier| modifier(query))
}
