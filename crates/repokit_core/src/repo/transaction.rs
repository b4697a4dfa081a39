//! Transaction scoping for repository callbacks.
//!
//! # Responsibility
//! - Open a transaction (or a savepoint when one is already active).
//! - Commit on `Ok`, roll back on `Err` or panic, then resume the panic.
//!
//! # Invariants
//! - Every begun scope ends committed or rolled back, never both, never
//!   neither: guards roll back on `Drop` unless explicitly finished.
//! - A panic payload is re-raised unchanged after rollback.

use crate::repo::error::RepoError;
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use uuid::Uuid;

/// Runs `f` inside a transaction on `conn`.
///
/// Nested calls on a connection that is already inside a transaction use a
/// uniquely named SAVEPOINT, so an inner failure only undoes inner writes.
pub fn in_transaction<R, E, F>(conn: &Connection, f: F) -> Result<R, E>
where
    E: From<RepoError>,
    F: FnOnce(&Connection) -> Result<R, E>,
{
    let started_at = Instant::now();
    let scope = TxScope::begin(conn).map_err(|err| {
        error!("event=tx_begin module=repo status=error error={err}");
        E::from(RepoError::from(err))
    })?;
    let kind = scope.kind();
    debug!("event=tx_begin module=repo status=ok kind={kind}");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(scope.connection())));
    match outcome {
        Ok(Ok(value)) => {
            if let Err(err) = scope.commit() {
                error!(
                    "event=tx_commit module=repo status=error kind={kind} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                return Err(E::from(RepoError::from(err)));
            }
            info!(
                "event=tx_commit module=repo status=ok kind={kind} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Ok(Err(err)) => {
            rollback(scope, "error", started_at);
            Err(err)
        }
        Err(payload) => {
            rollback(scope, "panic", started_at);
            panic::resume_unwind(payload)
        }
    }
}

fn rollback(scope: TxScope<'_>, reason: &str, started_at: Instant) {
    let kind = scope.kind();
    match scope.rollback() {
        Ok(()) => warn!(
            "event=tx_rollback module=repo status=ok kind={kind} reason={reason} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=tx_rollback module=repo status=error kind={kind} reason={reason} error={err}"
        ),
    }
}

enum TxScope<'conn> {
    Transaction(Transaction<'conn>),
    Savepoint(SavepointGuard<'conn>),
}

impl<'conn> TxScope<'conn> {
    fn begin(conn: &'conn Connection) -> rusqlite::Result<Self> {
        if conn.is_autocommit() {
            Ok(Self::Transaction(conn.unchecked_transaction()?))
        } else {
            Ok(Self::Savepoint(SavepointGuard::begin(conn)?))
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Transaction(_) => "transaction",
            Self::Savepoint(_) => "savepoint",
        }
    }

    fn connection(&self) -> &Connection {
        match self {
            Self::Transaction(tx) => &**tx,
            Self::Savepoint(savepoint) => savepoint.conn,
        }
    }

    fn commit(self) -> rusqlite::Result<()> {
        match self {
            Self::Transaction(tx) => tx.commit(),
            Self::Savepoint(savepoint) => savepoint.release(),
        }
    }

    fn rollback(self) -> rusqlite::Result<()> {
        match self {
            Self::Transaction(tx) => tx.rollback(),
            Self::Savepoint(savepoint) => savepoint.rollback(),
        }
    }
}

/// Savepoint on a shared connection; rolled back on drop unless finished.
struct SavepointGuard<'conn> {
    conn: &'conn Connection,
    name: String,
    open: bool,
}

impl<'conn> SavepointGuard<'conn> {
    fn begin(conn: &'conn Connection) -> rusqlite::Result<Self> {
        let name = format!("repokit_{}", Uuid::new_v4().simple());
        conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        Ok(Self {
            conn,
            name,
            open: true,
        })
    }

    fn release(mut self) -> rusqlite::Result<()> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {};", self.name))?;
        self.open = false;
        Ok(())
    }

    fn rollback(mut self) -> rusqlite::Result<()> {
        self.open = false;
        self.rollback_sql()
    }

    fn rollback_sql(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0};",
            self.name
        ))
    }
}

impl Drop for SavepointGuard<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        if let Err(err) = self.rollback_sql() {
            error!("event=tx_rollback module=repo status=error kind=savepoint reason=drop error={err}");
        }
    }
}
