//! Core types for sqlenv
//!
//! This crate holds the pieces with no engine behavior of their own:
//! environment identifiers, connection configuration, the table-definition
//! catalog, and the error taxonomy shared by every layer.

pub mod config;
pub mod env_id;
pub mod error;
pub mod table_def;

pub use config::{ConnDetails, MEMORY_DB};
pub use env_id::{EnvId, ENV_ID_VAR, MAX_ENVIRONMENTS};
pub use error::{Error, Result};
pub use table_def::{TableCatalog, TableDefinition};
