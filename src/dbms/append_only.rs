//! Append-only storage flavor.
//!
//! The base DBMS: databases are directories under a root, each table one
//! append-only CSV log. Every query takes the scan path — the whole log
//! is read, records land in a last-write-wins map keyed by primary key,
//! tombstoned keys are dropped, and the WHERE predicate filters what
//! survives. Updates and deletes materialize their matching rows with the
//! same scan before appending new record versions.
//!
//! ## On-disk layout
//!
//! ```text
//! <root>/
//!   <database>/
//!     tables/
//!       <table>.csv
//! ```
//!
//! Precondition checks (database selected, table exists / absent) run
//! before any file I/O and surface as user-facing [`DbmsError`]s.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, trace};

use crate::dbms::{Dbms, DbmsError, QueryResult, filter};
use crate::index::PRIMARY_KEY;
use crate::log::TableLog;
use crate::parser::ast::WhereClause;
use crate::record::{Record, Row};

/// Sub-directory of a database that holds its table logs.
const TABLES_DIR: &str = "tables";

/// File extension of table logs.
const TABLE_EXT: &str = "csv";

// ------------------------------------------------------------------------------------------------
// AppendOnlyDbms
// ------------------------------------------------------------------------------------------------

/// The scan-path storage flavor: a root directory plus the currently
/// selected database.
#[derive(Debug)]
pub struct AppendOnlyDbms {
    /// Directory that holds one sub-directory per database.
    root_dir: PathBuf,

    /// Selected database. Unset at startup; set only by `use_database`.
    current_database: Option<String>,
}

impl AppendOnlyDbms {
    /// Creates a DBMS rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DbmsError> {
        fs::create_dir_all(root.as_ref())?;

        info!("Opened append-only DBMS at {}", root.as_ref().display());

        Ok(Self {
            root_dir: root.as_ref().to_path_buf(),
            current_database: None,
        })
    }

    /// The currently selected database, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    // --------------------------------------------------------------------------------------------
    // Paths and preconditions
    // --------------------------------------------------------------------------------------------

    fn database_dir(&self, name: &str) -> PathBuf {
        self.root_dir.join(name)
    }

    fn tables_dir(&self, name: &str) -> PathBuf {
        self.database_dir(name).join(TABLES_DIR)
    }

    fn database_exists(&self, name: &str) -> bool {
        self.database_dir(name).is_dir()
    }

    /// Fails unless a database is selected.
    pub(crate) fn require_selected(&self) -> Result<&str, DbmsError> {
        self.current_database
            .as_deref()
            .ok_or(DbmsError::NoDatabaseSelected)
    }

    /// Path of a table's log within the selected database.
    fn table_path(&self, table: &str) -> Result<PathBuf, DbmsError> {
        let db = self.require_selected()?;
        Ok(self
            .tables_dir(db)
            .join(format!("{table}.{TABLE_EXT}")))
    }

    /// Fails unless `table` exists in the selected database.
    pub(crate) fn require_table_exists(&self, table: &str) -> Result<PathBuf, DbmsError> {
        let path = self.table_path(table)?;
        if !path.is_file() {
            return Err(DbmsError::TableNotFound(table.to_string()));
        }
        Ok(path)
    }

    /// Fails if `table` already exists in the selected database.
    fn require_table_absent(&self, table: &str) -> Result<PathBuf, DbmsError> {
        let path = self.table_path(table)?;
        if path.is_file() {
            return Err(DbmsError::TableAlreadyExists(table.to_string()));
        }
        Ok(path)
    }

    // --------------------------------------------------------------------------------------------
    // Shared table machinery
    // --------------------------------------------------------------------------------------------

    /// Opens the log of an existing table.
    pub(crate) fn open_log(&self, table: &str) -> Result<TableLog, DbmsError> {
        let path = self.require_table_exists(table)?;
        Ok(TableLog::open(path)?)
    }

    /// Lists the tables of the selected database, sorted by name.
    pub(crate) fn list_tables(&self) -> Result<Vec<String>, DbmsError> {
        let db = self.require_selected()?;
        let mut tables = Vec::new();

        for entry in fs::read_dir(self.tables_dir(db))? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(TABLE_EXT)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                tables.push(stem.to_string());
            }
        }

        tables.sort();
        Ok(tables)
    }

    /// Replays a table's log into the set of live records.
    ///
    /// Records land in a last-write-wins map keyed by primary key; a key's
    /// position is its first occurrence in the log, so result ordering is
    /// reproducible across runs. Keys whose final record is a tombstone
    /// are dropped.
    pub(crate) fn scan_live_records(&self, table: &str) -> Result<Vec<Record>, DbmsError> {
        let log = self.open_log(table)?;

        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, Record> = HashMap::new();

        for entry in log.scan()? {
            let (_, _, record) = entry?;
            let key = record
                .row
                .get(PRIMARY_KEY)
                .ok_or_else(|| DbmsError::CorruptRecord(PRIMARY_KEY.to_string()))?
                .to_string();

            if !latest.contains_key(&key) {
                order.push(key.clone());
            }
            latest.insert(key, record);
        }

        let live = order
            .into_iter()
            .filter_map(|key| latest.remove(&key))
            .filter(|record| !record.deleted)
            .collect();

        Ok(live)
    }

    /// Appends one record version, returning its byte range for index
    /// maintenance in the indexed flavor.
    pub(crate) fn append_record(
        &self,
        table: &str,
        row: &Row,
        deleted: bool,
    ) -> Result<(u64, u64), DbmsError> {
        let log = self.open_log(table)?;
        let range = log.append(row, deleted)?;
        trace!(
            "Appended to table {:?} at [{}, {}) deleted={}",
            table, range.0, range.1, deleted
        );
        Ok(range)
    }

    /// Scan-path query shared by both flavors.
    pub(crate) fn scan_query(
        &self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        let started = Instant::now();

        let live = self.scan_live_records(table)?;
        let rows = live
            .into_iter()
            .filter(|record| where_clause.is_none_or(|clause| filter::matches(clause, record)))
            .map(|record| record.row)
            .collect();

        Ok(QueryResult::with_timing(rows, started.elapsed()))
    }
}

// ------------------------------------------------------------------------------------------------
// Dbms implementation
// ------------------------------------------------------------------------------------------------

impl Dbms for AppendOnlyDbms {
    fn create_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        if self.database_exists(name) {
            return Err(DbmsError::DatabaseAlreadyExists(name.to_string()));
        }

        fs::create_dir_all(self.tables_dir(name))?;
        info!("Created database {:?}", name);
        Ok(QueryResult::ok())
    }

    fn show_databases(&self) -> Result<QueryResult, DbmsError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let path = entry?.path();
            if path.is_dir()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                names.push(name.to_string());
            }
        }
        names.sort();

        let rows = names
            .into_iter()
            .map(|name| Row::from_pairs([("database", name)]))
            .collect();
        Ok(QueryResult::with_rows(rows))
    }

    fn drop_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        if !self.database_exists(name) {
            return Err(DbmsError::DatabaseNotFound(name.to_string()));
        }

        fs::remove_dir_all(self.database_dir(name))?;

        // The selected database must always exist on disk.
        if self.current_database.as_deref() == Some(name) {
            self.current_database = None;
        }

        info!("Dropped database {:?}", name);
        Ok(QueryResult::ok())
    }

    fn use_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        if !self.database_exists(name) {
            return Err(DbmsError::DatabaseNotFound(name.to_string()));
        }

        self.current_database = Some(name.to_string());
        info!("Selected database {:?}", name);
        Ok(QueryResult::ok())
    }

    fn show_tables(&self) -> Result<QueryResult, DbmsError> {
        let rows = self
            .list_tables()?
            .into_iter()
            .map(|name| Row::from_pairs([("table", name)]))
            .collect();
        Ok(QueryResult::with_rows(rows))
    }

    fn create_table(
        &mut self,
        table: &str,
        columns: Option<Vec<String>>,
    ) -> Result<QueryResult, DbmsError> {
        let path = self.require_table_absent(table)?;

        let columns = columns.unwrap_or_else(|| vec![PRIMARY_KEY.to_string()]);
        if !columns.iter().any(|c| c == PRIMARY_KEY) {
            return Err(DbmsError::MissingPrimaryKeyColumn);
        }

        TableLog::create(path, &columns)?;
        info!("Created table {:?} with columns {:?}", table, columns);
        Ok(QueryResult::ok())
    }

    fn drop_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        let path = self.require_table_exists(table)?;
        fs::remove_file(path)?;
        info!("Dropped table {:?}", table);
        Ok(QueryResult::ok())
    }

    fn insert(&mut self, table: &str, row: Row) -> Result<QueryResult, DbmsError> {
        self.require_table_exists(table)?;
        if row.get(PRIMARY_KEY).is_none() {
            return Err(DbmsError::RowWithoutPrimaryKey);
        }

        self.append_record(table, &row, false)?;
        Ok(QueryResult::ok())
    }

    fn update(
        &mut self,
        table: &str,
        set_clause: &Row,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        if set_clause.get(PRIMARY_KEY).is_some() {
            return Err(DbmsError::UpdateOfPrimaryKey);
        }

        // Materialize the matching rows first, then append new versions.
        let matching = self.query(table, where_clause)?.rows;
        for row in matching {
            let mut updated = row;
            for (column, value) in set_clause.iter() {
                updated.set(column, value);
            }
            self.append_record(table, &updated, false)?;
        }

        Ok(QueryResult::ok())
    }

    fn delete(
        &mut self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        let matching = self.query(table, where_clause)?.rows;
        for row in matching {
            self.append_record(table, &row, true)?;
        }

        Ok(QueryResult::ok())
    }

    fn query(
        &self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        self.scan_query(table, where_clause)
    }

    fn compact_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        let survivors: Vec<Row> = self
            .scan_live_records(table)?
            .into_iter()
            .map(|record| record.row)
            .collect();

        let log = self.open_log(table)?;
        log.rewrite(&survivors)?;

        info!(
            "Compacted table {:?} down to {} rows",
            table,
            survivors.len()
        );
        Ok(QueryResult::ok())
    }
}
