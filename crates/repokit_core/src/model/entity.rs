//! Record capability required by the generic repository.
//!
//! # Responsibility
//! - Describe how one record type maps onto one table.
//! - Give uniform identifier access without reflection.
//!
//! # Invariants
//! - `values()` yields exactly one value per `COLUMNS` entry, same order.
//! - `COLUMNS` never contains `ID_COLUMN`.
//! - `from_row` decodes by column name so joined or reordered projections
//!   still map correctly.

use rusqlite::types::Value;
use rusqlite::Row;

/// Primary identifier shared by every entity (SQLite integer key / rowid).
pub type EntityId = i64;

/// A record type persisted in exactly one table.
///
/// ```ignore
/// struct Contact {
///     id: Option<EntityId>,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl Entity for Contact {
///     const TABLE: &'static str = "contacts";
///     const COLUMNS: &'static [&'static str] = &["name", "email"];
///
///     fn id(&self) -> Option<EntityId> {
///         self.id
///     }
///
///     fn values(&self) -> Vec<Value> {
///         vec![self.name.clone().into(), self.email.clone().into()]
///     }
///
///     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             name: row.get("name")?,
///             email: row.get("email")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// Table holding this record type.
    const TABLE: &'static str;
    /// Primary identifier column.
    const ID_COLUMN: &'static str = "id";
    /// Writable columns excluding the identifier, in `values()` order.
    const COLUMNS: &'static [&'static str];

    /// Returns the persisted identifier, or `None` for a record not yet stored.
    fn id(&self) -> Option<EntityId>;

    /// Returns bind values for `COLUMNS`.
    fn values(&self) -> Vec<Value>;

    /// Decodes one full row, generated columns included.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
