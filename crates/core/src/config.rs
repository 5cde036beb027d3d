//! Connection configuration
//!
//! One JSON file per environment (`dbconn<N>.json`) holds the connection
//! parameters. The core requires nothing of them beyond successful
//! decoding; engines that are file-backed only consume `dbName`.

use crate::env_id::EnvId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Database name that opens an in-memory database
pub const MEMORY_DB: &str = ":memory:";

/// Connection parameters for one environment, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnDetails {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Login user
    pub user: String,
    /// Login password
    pub password: String,
    /// Database name; for file-backed engines this is the database path
    pub db_name: String,
}

impl ConnDetails {
    /// Load the connection parameters for `id` from `dir/dbconn<N>.json`
    ///
    /// An unreadable file is a [`Error::Config`]; a file that does not
    /// decode is a [`Error::Json`]. Both are returned, never fatal.
    pub fn load(dir: &Path, id: EnvId) -> Result<ConnDetails> {
        let path = dir.join(id.config_file_name());
        let bytes = fs::read(&path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Parameters for an in-memory database (tests, scratch environments)
    pub fn in_memory() -> ConnDetails {
        ConnDetails {
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            db_name: MEMORY_DB.to_string(),
        }
    }

    /// True when these parameters target an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_name == MEMORY_DB
    }
}
