//! Process-wide store handle for implicit repository access.
//!
//! # Responsibility
//! - Hold one connection installed during process startup.
//! - Lend it to callers one at a time.
//!
//! # Invariants
//! - `install` succeeds at most once per process; the handle is never
//!   reassigned afterwards.
//! - Access is serialized through a mutex since `Connection` is not `Sync`.
//! - A poisoned lock is recovered: a panicking transactional callback has
//!   already rolled back before the lock is released.
//! - Global access does not nest. A thread that already holds the handle gets
//!   `DbError::GlobalReentered` instead of blocking on its own lock.
//!
//! Prefer passing a `&Connection` to `SqliteRepository::new`; this module
//! exists for callers that need singleton-style access.

use super::{DbError, DbResult};
use crate::model::entity::Entity;
use crate::repo::error::RepoError;
use crate::repo::SqliteRepository;
use log::{info, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::cell::Cell;
use std::sync::{Mutex, PoisonError};

static GLOBAL_STORE: OnceCell<Mutex<Connection>> = OnceCell::new();

thread_local! {
    static HOLDING_GLOBAL: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as holding the global handle until dropped.
struct HoldMarker;

impl HoldMarker {
    fn acquire() -> DbResult<Self> {
        if HOLDING_GLOBAL.with(|holding| holding.replace(true)) {
            warn!("event=global_lock module=db status=rejected reason=reentered");
            return Err(DbError::GlobalReentered);
        }
        Ok(Self)
    }
}

impl Drop for HoldMarker {
    fn drop(&mut self) {
        HOLDING_GLOBAL.with(|holding| holding.set(false));
    }
}

/// Installs the process-wide connection.
///
/// # Errors
/// - `DbError::GlobalAlreadyInstalled` on any call after the first success.
pub fn install(conn: Connection) -> DbResult<()> {
    match GLOBAL_STORE.set(Mutex::new(conn)) {
        Ok(()) => {
            info!("event=global_install module=db status=ok");
            Ok(())
        }
        Err(_) => {
            warn!("event=global_install module=db status=rejected reason=already_installed");
            Err(DbError::GlobalAlreadyInstalled)
        }
    }
}

pub fn is_installed() -> bool {
    GLOBAL_STORE.get().is_some()
}

/// Runs `f` with exclusive access to the global connection.
///
/// # Errors
/// - `DbError::GlobalNotInstalled` before `install`.
/// - `DbError::GlobalReentered` when called from inside another global
///   callback on the same thread.
pub fn with_connection<R>(f: impl FnOnce(&Connection) -> R) -> DbResult<R> {
    let store = GLOBAL_STORE.get().ok_or(DbError::GlobalNotInstalled)?;
    let _marker = HoldMarker::acquire()?;
    let guard = store.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!("event=global_lock module=db status=recovered reason=poisoned");
        poisoned.into_inner()
    });
    Ok(f(&guard))
}

/// Runs `f` with a repository bound to the global connection.
///
/// Calls do not nest. Inside `f`, reach other entity types with
/// `SqliteRepository::<U>::new(repo.connection())`; a nested
/// `with_repository` returns `DbError::GlobalReentered`.
pub fn with_repository<T, R, E, F>(f: F) -> Result<R, E>
where
    T: Entity,
    E: From<RepoError>,
    F: FnOnce(&SqliteRepository<'_, T>) -> Result<R, E>,
{
    with_connection(|conn| f(&SqliteRepository::new(conn)))
        .map_err(|err| E::from(RepoError::from(err)))?
}
