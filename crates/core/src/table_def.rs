//! Table definitions and the definition catalog
//!
//! A [`TableDefinition`] is the static descriptor for one table: the DDL
//! body used at creation time and the parameterized insert body prepared
//! once per environment. Definitions live in a [`TableCatalog`], an
//! explicit service object populated by the host during startup. A table
//! executor may only be created for a name present in the catalog.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Static descriptor for one table
///
/// The table name is substituted into both fragments by the engine:
/// `CREATE TABLE <name> <ddl_columns>` at creation time and
/// `INSERT INTO <name> <insert>` at prepare time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name, also the catalog key
    pub name: String,
    /// Column/constraint body of the CREATE TABLE statement
    pub ddl_columns: String,
    /// Parameterized body of the insert statement
    pub insert: String,
}

impl TableDefinition {
    /// Create a definition from its three fragments
    pub fn new(
        name: impl Into<String>,
        ddl_columns: impl Into<String>,
        insert: impl Into<String>,
    ) -> TableDefinition {
        TableDefinition {
            name: name.into(),
            ddl_columns: ddl_columns.into(),
            insert: insert.into(),
        }
    }
}

/// Keyed store of table definitions
///
/// Registration is permissive: the last definition registered under a name
/// wins, with no error on overwrite. Population normally happens during
/// single-threaded startup, but the catalog tolerates concurrent use.
#[derive(Debug, Default)]
pub struct TableCatalog {
    defs: RwLock<HashMap<String, TableDefinition>>,
}

impl TableCatalog {
    /// Create an empty catalog
    pub fn new() -> TableCatalog {
        TableCatalog::default()
    }

    /// Insert or overwrite the definition keyed by its name
    pub fn register(&self, def: TableDefinition) {
        self.defs.write().insert(def.name.clone(), def);
    }

    /// Look up a definition by name
    pub fn lookup(&self, name: &str) -> Option<TableDefinition> {
        self.defs.read().get(name).cloned()
    }

    /// Check whether a definition is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.defs.read().contains_key(name)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.defs.read().len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.defs.read().is_empty()
    }
}
