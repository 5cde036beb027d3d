//! sqlenv - per-environment database connections with lazy table
//! materialization
//!
//! Multiple logical environments (test, run, perf-test…) coexist in one
//! process, each bound to its own database connection and its own set of
//! table executors. Tables are verified or created on first use and their
//! insert statements prepared once, so repeated writes never re-parse SQL
//! and repeated startups never re-run DDL.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlenv::{EnvId, EnvRegistry, Environment, TableCatalog, TableDefinition};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(TableCatalog::new());
//! catalog.register(TableDefinition::new(
//!     "events",
//!     "(id integer, payload text)",
//!     "(id, payload) values (?1, ?2)",
//! ));
//!
//! let registry = EnvRegistry::new();
//! let env = registry.get_or_create(EnvId::Main, |id| {
//!     Environment::bootstrap(id, "conf".as_ref(), Arc::clone(&catalog))
//! })?;
//!
//! let events = env.get_or_create_table_exec("events")?;
//! events.insert(sqlenv::rusqlite::params![1, "hello"])?;
//! ```

pub use sqlenv_core::{
    ConnDetails, EnvId, Error, Result, TableCatalog, TableDefinition, ENV_ID_VAR,
    MAX_ENVIRONMENTS, MEMORY_DB,
};
pub use sqlenv_engine::{rusqlite, EnvRegistry, Environment, TableExec};
