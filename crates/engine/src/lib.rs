//! sqlenv engine
//!
//! Live environment objects, the process-scoped environment registry, and
//! the table executors that lazily materialize schemas and cache prepared
//! insert statements.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlenv_engine::{EnvRegistry, Environment};
//! use sqlenv_core::{EnvId, TableCatalog, TableDefinition};
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
//! events.insert(rusqlite::params![1, "hello"])?;
//! ```

pub mod environment;
pub mod registry;
pub mod table_exec;

pub use environment::Environment;
pub use registry::EnvRegistry;
pub use table_exec::TableExec;

// Callers bind parameters with `rusqlite::params!` and read rows inside
// `with_connection`, so the client crate is part of the public surface.
pub use rusqlite;
