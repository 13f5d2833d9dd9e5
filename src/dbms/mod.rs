//! # DBMS Module
//!
//! Catalog state and table operations. Two storage flavors implement the
//! same [`Dbms`] contract:
//!
//! - [`AppendOnlyDbms`](append_only::AppendOnlyDbms) — every query walks
//!   the whole log (the scan path).
//! - [`IndexedDbms`](indexed::IndexedDbms) — composes the append-only
//!   flavor with one [`HashIndex`](crate::index::HashIndex) per table of
//!   the selected database, giving `WHERE id = <literal>` queries a
//!   single bounded read.
//!
//! The flavors form a closed set: [`Storage`] is the sum type the engine
//! holds, and adding a flavor forces every dispatch site to handle it.
//!
//! ## Design Invariants
//!
//! - A selected database always corresponds to an existing directory.
//! - Preconditions (database selected, table exists / does not exist) are
//!   checked before any file I/O.
//! - Indexes are owned by the catalog, never by callers; the index maps
//!   of the indexed flavor are rebuilt wholesale on `use_database`.
//! - Multi-row updates and deletes are not atomic: a mid-loop failure
//!   leaves the records already appended in place.

// ------------------------------------------------------------------------------------------------
// Submodules
// ------------------------------------------------------------------------------------------------

pub mod append_only;
pub mod filter;
pub mod indexed;

#[cfg(test)]
mod tests;

pub use append_only::AppendOnlyDbms;
pub use indexed::IndexedDbms;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::index::{IndexError, PRIMARY_KEY};
use crate::log::LogError;
use crate::parser::ast::WhereClause;
use crate::record::Row;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by catalog and table operations.
#[derive(Debug, Error)]
pub enum DbmsError {
    /// No database has been selected yet.
    #[error("No database selected. Use 'USE <database>;' to select a database first")]
    NoDatabaseSelected,

    /// Creating a database that already exists.
    #[error("Database {0:?} already exists")]
    DatabaseAlreadyExists(String),

    /// Referencing a database that does not exist.
    #[error("Database {0:?} does not exist")]
    DatabaseNotFound(String),

    /// Creating a table that already exists.
    #[error("Table {0:?} already exists")]
    TableAlreadyExists(String),

    /// Referencing a table that does not exist.
    #[error("Table {0:?} does not exist")]
    TableNotFound(String),

    /// A table must declare the primary-key column.
    #[error("Table columns must include {PRIMARY_KEY:?}")]
    MissingPrimaryKeyColumn,

    /// An inserted row without a primary-key cell.
    #[error("Row is missing the {PRIMARY_KEY:?} cell")]
    RowWithoutPrimaryKey,

    /// The primary key of an append-only table cannot be rewritten.
    #[error("Cannot update the {PRIMARY_KEY:?} column of an append-only table")]
    UpdateOfPrimaryKey,

    /// A fully decoded record is missing a column the predicate needs.
    #[error("Corrupt record: column {0:?} missing from decoded row")]
    CorruptRecord(String),

    /// Table log failure (I/O or record corruption).
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Hash index failure during rebuild.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Underlying filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

// ------------------------------------------------------------------------------------------------
// Query results
// ------------------------------------------------------------------------------------------------

/// Outcome marker of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Success,
    Error,
}

/// The uniform result envelope every statement produces.
///
/// SHOW statements return single-cell rows carrying the bare database or
/// table name; data queries return the surviving rows with the tombstone
/// column already dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub status: QueryStatus,
    pub rows: Vec<Row>,
    pub elapsed: Duration,
    pub message: String,
}

impl QueryResult {
    /// A successful acknowledgement with no rows.
    pub fn ok() -> Self {
        Self {
            status: QueryStatus::Success,
            rows: Vec::new(),
            elapsed: Duration::ZERO,
            message: String::new(),
        }
    }

    /// A successful result carrying rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::ok()
        }
    }

    /// A successful result carrying rows and a measured duration.
    pub fn with_timing(rows: Vec<Row>, elapsed: Duration) -> Self {
        Self {
            rows,
            elapsed,
            ..Self::ok()
        }
    }

    /// An error envelope.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: QueryStatus::Error,
            rows: Vec::new(),
            elapsed: Duration::ZERO,
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            QueryStatus::Success => {
                writeln!(f, "OK")?;
                for row in &self.rows {
                    let cells: Vec<String> =
                        row.iter().map(|(c, v)| format!("{c}={v}")).collect();
                    writeln!(f, "  {}", cells.join(", "))?;
                }
                write!(f, "time={:?}", self.elapsed)?;
                if !self.message.is_empty() {
                    write!(f, "\n{}", self.message)?;
                }
                Ok(())
            }
            QueryStatus::Error => write!(f, "ERROR\n{}", self.message),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// The Dbms contract
// ------------------------------------------------------------------------------------------------

/// The operations the executor dispatches. Exactly one method per
/// statement kind, plus compaction (an API-level maintenance operation
/// with no statement syntax).
pub trait Dbms {
    fn create_database(&mut self, name: &str) -> Result<QueryResult, DbmsError>;
    fn show_databases(&self) -> Result<QueryResult, DbmsError>;
    fn drop_database(&mut self, name: &str) -> Result<QueryResult, DbmsError>;
    fn use_database(&mut self, name: &str) -> Result<QueryResult, DbmsError>;

    fn show_tables(&self) -> Result<QueryResult, DbmsError>;
    fn create_table(
        &mut self,
        table: &str,
        columns: Option<Vec<String>>,
    ) -> Result<QueryResult, DbmsError>;
    fn drop_table(&mut self, table: &str) -> Result<QueryResult, DbmsError>;

    fn insert(&mut self, table: &str, row: Row) -> Result<QueryResult, DbmsError>;
    fn update(
        &mut self,
        table: &str,
        set_clause: &Row,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError>;
    fn delete(
        &mut self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError>;
    fn query(
        &self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError>;
    fn compact_table(&mut self, table: &str) -> Result<QueryResult, DbmsError>;
}

// ------------------------------------------------------------------------------------------------
// Storage flavors
// ------------------------------------------------------------------------------------------------

/// Which storage flavor an engine instance runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Scan-only queries, no in-memory index.
    AppendOnly,

    /// Hash-indexed primary-key lookups.
    #[default]
    Indexed,
}

/// The closed set of storage flavors.
pub enum Storage {
    AppendOnly(AppendOnlyDbms),
    Indexed(IndexedDbms),
}

impl Dbms for Storage {
    fn create_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.create_database(name),
            Storage::Indexed(dbms) => dbms.create_database(name),
        }
    }

    fn show_databases(&self) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.show_databases(),
            Storage::Indexed(dbms) => dbms.show_databases(),
        }
    }

    fn drop_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.drop_database(name),
            Storage::Indexed(dbms) => dbms.drop_database(name),
        }
    }

    fn use_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.use_database(name),
            Storage::Indexed(dbms) => dbms.use_database(name),
        }
    }

    fn show_tables(&self) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.show_tables(),
            Storage::Indexed(dbms) => dbms.show_tables(),
        }
    }

    fn create_table(
        &mut self,
        table: &str,
        columns: Option<Vec<String>>,
    ) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.create_table(table, columns),
            Storage::Indexed(dbms) => dbms.create_table(table, columns),
        }
    }

    fn drop_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.drop_table(table),
            Storage::Indexed(dbms) => dbms.drop_table(table),
        }
    }

    fn insert(&mut self, table: &str, row: Row) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.insert(table, row),
            Storage::Indexed(dbms) => dbms.insert(table, row),
        }
    }

    fn update(
        &mut self,
        table: &str,
        set_clause: &Row,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.update(table, set_clause, where_clause),
            Storage::Indexed(dbms) => dbms.update(table, set_clause, where_clause),
        }
    }

    fn delete(
        &mut self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.delete(table, where_clause),
            Storage::Indexed(dbms) => dbms.delete(table, where_clause),
        }
    }

    fn query(
        &self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.query(table, where_clause),
            Storage::Indexed(dbms) => dbms.query(table, where_clause),
        }
    }

    fn compact_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        match self {
            Storage::AppendOnly(dbms) => dbms.compact_table(table),
            Storage::Indexed(dbms) => dbms.compact_table(table),
        }
    }
}
