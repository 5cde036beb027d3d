//! Error types for sqlenv
//!
//! One enum covers the whole failure taxonomy. Database errors from the
//! check-or-create protocol keep their `rusqlite` source so callers can
//! distinguish probe, DDL, and preparation failures without losing the
//! underlying cause.

use crate::env_id::EnvId;
use std::io;
use thiserror::Error;

/// Result type alias for sqlenv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqlenv
#[derive(Debug, Error)]
pub enum Error {
    /// No table definition registered under this name (configuration error)
    #[error("no table definition registered for '{0}'")]
    UnknownTable(String),

    /// The environment has no live database connection
    #[error("no live database connection for environment {0}")]
    NoConnection(EnvId),

    /// The table existence probe failed for a reason other than "no rows"
    #[error("existence probe for table '{table}' failed: {source}")]
    Probe {
        /// Table being probed
        table: String,
        /// Underlying query error, kind preserved
        #[source]
        source: rusqlite::Error,
    },

    /// The CREATE TABLE statement failed
    #[error("creating table '{table}' failed: {source}")]
    Ddl {
        /// Table being created
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Preparing the insert statement failed
    #[error("preparing insert for table '{table}' failed: {source}")]
    Prepare {
        /// Table the statement targets
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Environment factory could not produce a usable environment
    #[error("environment {id} bootstrap failed: {reason}")]
    Bootstrap {
        /// Environment that failed to come up
        id: EnvId,
        /// Human-readable cause
        reason: String,
    },

    /// An insert affected a row count other than one
    #[error("insert into '{table}' affected {actual} rows, expected exactly 1")]
    RowCount {
        /// Table inserted into
        table: String,
        /// Rows actually affected
        actual: usize,
    },

    /// Insert attempted before the statement was successfully prepared
    #[error("insert statement for table '{0}' is not prepared")]
    NotPrepared(String),

    /// Operation on an executor that was already closed
    #[error("table executor for '{0}' is closed")]
    ExecutorClosed(String),

    /// Invalid configuration (unreadable file, bad identifier, bad slot)
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Uncategorized database error
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_unknown_table() {
        let err = Error::UnknownTable("ghost".to_string());
        let msg = err.to_string();
        assert!(msg.contains("no table definition"));
        assert!(msg.contains("ghost"));
    }

    #[test]
    fn test_error_display_no_connection() {
        let err = Error::NoConnection(EnvId::Run);
        assert!(err.to_string().contains("environment 2"));
    }

    #[test]
    fn test_probe_source_preserved() {
        let err = Error::Probe {
            table: "events".to_string(),
            source: rusqlite::Error::QueryReturnedNoRows,
        };
        // The original query error stays reachable through source()
        let source = err.source().expect("probe error carries a source");
        let sql_err = source
            .downcast_ref::<rusqlite::Error>()
            .expect("source is a rusqlite error");
        assert!(matches!(sql_err, rusqlite::Error::QueryReturnedNoRows));
    }

    #[test]
    fn test_error_display_bootstrap() {
        let err = Error::Bootstrap {
            id: EnvId::PerfTest,
            reason: "config missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("environment 3"));
        assert!(msg.contains("config missing"));
    }

    #[test]
    fn test_error_display_row_count() {
        let err = Error::RowCount {
            table: "events".to_string(),
            actual: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("events"));
        assert!(msg.contains("0 rows"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let result: std::result::Result<u32, serde_json::Error> =
            serde_json::from_str("not json");
        let err: Error = result.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
