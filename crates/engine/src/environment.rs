//! Environment lifecycle and connection ownership
//!
//! An [`Environment`] binds one environment id to one live database
//! connection and one set of table executors. The connection handle is
//! owned exclusively by the environment: executors use it through
//! [`Environment::with_connection`], and only the environment closes it.
//!
//! # Locking
//!
//! Two locks, never nested the other way around:
//!
//! - `table_execs` serializes the whole check-or-create protocol for this
//!   environment, across all table names (coarse by design; schema work is
//!   rare next to runtime inserts).
//! - `conn` guards the connection handle itself and is taken second.

use crate::table_exec::TableExec;
use parking_lot::Mutex;
use rusqlite::Connection;
use sqlenv_core::{ConnDetails, EnvId, Error, Result, TableCatalog};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of once-only initialization slots per environment
pub const MAX_INIT_SLOTS: usize = 4;

/// One isolated runtime context: an id, a connection, and its executors
///
/// Created through [`Environment::bootstrap`] (config file) or
/// [`Environment::open`] (explicit parameters), always behind an `Arc` so
/// executors can hold a weak back-reference.
pub struct Environment {
    id: EnvId,
    details: ConnDetails,
    pub(crate) catalog: Arc<TableCatalog>,
    pub(crate) conn: Mutex<Option<Connection>>,
    pub(crate) table_execs: Mutex<HashMap<String, Arc<TableExec>>>,
    init_slots: [Mutex<bool>; MAX_INIT_SLOTS],
}

impl Environment {
    /// Open an environment from explicit connection parameters
    ///
    /// Opens the database and runs a liveness probe. `":memory:"` as the
    /// database name opens a private in-memory database.
    pub fn open(
        id: EnvId,
        details: ConnDetails,
        catalog: Arc<TableCatalog>,
    ) -> Result<Arc<Environment>> {
        let conn = open_database(id, &details)?;
        Ok(Arc::new(Environment {
            id,
            details,
            catalog,
            conn: Mutex::new(Some(conn)),
            table_execs: Mutex::new(HashMap::new()),
            init_slots: Default::default(),
        }))
    }

    /// Open an environment from its on-disk config file
    ///
    /// Reads `config_dir/dbconn<N>.json`, then opens the database. Every
    /// failure on this path comes back as [`Error::Bootstrap`] so registry
    /// callers see one "environment unavailable" kind.
    pub fn bootstrap(
        id: EnvId,
        config_dir: &Path,
        catalog: Arc<TableCatalog>,
    ) -> Result<Arc<Environment>> {
        let details = ConnDetails::load(config_dir, id).map_err(|e| Error::Bootstrap {
            id,
            reason: e.to_string(),
        })?;
        Environment::open(id, details, catalog).map_err(|e| Error::Bootstrap {
            id,
            reason: e.to_string(),
        })
    }

    /// Identifier of this environment
    #[inline]
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// Connection parameters this environment was opened with
    pub fn details(&self) -> &ConnDetails {
        &self.details
    }

    /// Number of table executors currently cached
    pub fn table_exec_count(&self) -> usize {
        self.table_execs.lock().len()
    }

    /// Run `f` against the live connection
    ///
    /// Returns [`Error::NoConnection`] once the environment is closed.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> Result<R>) -> Result<R> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(Error::NoConnection(self.id))?;
        f(conn)
    }

    /// Run `f` at most once per environment lifetime for the given slot
    ///
    /// A failed `f` leaves the slot not-done, so a later call retries.
    /// Callers racing on the same slot are serialized; `f` never runs
    /// twice after one success.
    pub fn init_once(&self, slot: usize, f: impl FnOnce() -> Result<()>) -> Result<()> {
        let slot_lock = self
            .init_slots
            .get(slot)
            .ok_or_else(|| Error::Config(format!("init slot {slot} out of range")))?;
        let mut done = slot_lock.lock();
        if *done {
            return Ok(());
        }
        f()?;
        *done = true;
        Ok(())
    }

    /// Check whether an init slot has completed
    pub fn init_done(&self, slot: usize) -> bool {
        self.init_slots
            .get(slot)
            .map(|s| *s.lock())
            .unwrap_or(false)
    }

    /// Close this environment
    ///
    /// Closes every cached executor exactly once (logging, not
    /// propagating, individual failures), clears the cache, then closes
    /// the connection handle. Safe to call twice; the second call is a
    /// no-op. Does not touch the registry; use
    /// [`crate::EnvRegistry::close_env`] for that.
    pub fn close(&self) -> Result<()> {
        info!(env = %self.id, "closing environment");
        {
            let mut execs = self.table_execs.lock();
            for (name, exec) in execs.drain() {
                if let Err(e) = exec.close() {
                    warn!(env = %self.id, table = %name, error = %e,
                        "closing table executor failed");
                }
            }
        }
        let conn = self.conn.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| Error::Sql(e))?;
        }
        Ok(())
    }

    /// Tear down this environment's data, then close it
    ///
    /// Drops every table an executor exists for and resets the init
    /// slots, so a later environment for the same database starts clean.
    pub fn destroy(&self) -> Result<()> {
        let names: Vec<String> = self.table_execs.lock().keys().cloned().collect();
        {
            let guard = self.conn.lock();
            match guard.as_ref() {
                Some(conn) => {
                    for name in &names {
                        debug!(env = %self.id, table = %name, "dropping table");
                        if let Err(e) =
                            conn.execute_batch(&format!("DROP TABLE IF EXISTS {name}"))
                        {
                            warn!(env = %self.id, table = %name, error = %e,
                                "dropping table failed");
                        }
                    }
                }
                None => {
                    warn!(env = %self.id, "no live connection while destroying environment");
                }
            }
        }
        for slot in &self.init_slots {
            *slot.lock() = false;
        }
        self.close()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("db_name", &self.details.db_name)
            .field("table_execs", &self.table_exec_count())
            .finish()
    }
}

/// Open the database named by `details` and verify it answers
fn open_database(id: EnvId, details: &ConnDetails) -> Result<Connection> {
    debug!(env = %id, user = %details.user, db = %details.db_name, "opening database");
    let conn = if details.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        Connection::open(&details.db_name)?
    };
    // Liveness probe; open failures can otherwise surface lazily
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    debug!(env = %id, db = %details.db_name, "database opened");
    Ok(conn)
}
