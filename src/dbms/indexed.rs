//! Hash-indexed storage flavor.
//!
//! Composes [`AppendOnlyDbms`] with one [`HashIndex`] per table of the
//! selected database. The write path keeps every index in lockstep with
//! its log: inserts record the byte range the append reported, deletes
//! remove the key, compaction rebuilds from the rewritten file, and
//! `use_database` rebuilds every index by replaying the logs.
//!
//! The read path splits on the shape of the predicate: a top-level
//! `id = <literal>` goes through the index — one lookup, one seek, one
//! bounded read — and anything else falls back to the scan path of the
//! base flavor.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use tracing::{info, trace};

use crate::dbms::{AppendOnlyDbms, Dbms, DbmsError, QueryResult, filter};
use crate::index::{HashIndex, IndexError, PRIMARY_KEY};
use crate::parser::ast::{WhereClause, strip_single_quotes};
use crate::record::Row;

// ------------------------------------------------------------------------------------------------
// IndexedDbms
// ------------------------------------------------------------------------------------------------

/// The indexed storage flavor.
pub struct IndexedDbms {
    /// The append-only flavor providing catalog state and the scan path.
    base: AppendOnlyDbms,

    /// One index per table of the selected database. Owned exclusively
    /// here; rebuilt wholesale on `use_database`.
    indexes: HashMap<String, HashIndex>,
}

impl IndexedDbms {
    /// Creates an indexed DBMS rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DbmsError> {
        Ok(Self {
            base: AppendOnlyDbms::new(root)?,
            indexes: HashMap::new(),
        })
    }

    /// The currently selected database, if any.
    pub fn current_database(&self) -> Option<&str> {
        self.base.current_database()
    }

    /// Number of live keys in a table's index. Test and tooling hook.
    pub fn index_len(&self, table: &str) -> Option<usize> {
        self.indexes.get(table).map(HashIndex::len)
    }

    /// Byte range a table's index holds for `key`. Test and tooling hook.
    pub fn index_offsets(&self, table: &str, key: &str) -> Option<(u64, u64)> {
        self.indexes.get(table)?.get(key).ok()
    }

    fn index(&self, table: &str) -> Result<&HashIndex, DbmsError> {
        self.indexes
            .get(table)
            .ok_or_else(|| DbmsError::Internal(format!("no index for table {table:?}")))
    }

    fn index_mut(&mut self, table: &str) -> Result<&mut HashIndex, DbmsError> {
        self.indexes
            .get_mut(table)
            .ok_or_else(|| DbmsError::Internal(format!("no index for table {table:?}")))
    }

    /// Appends a live record and points the index at it.
    fn append_live(&mut self, table: &str, row: &Row) -> Result<(), DbmsError> {
        let key = row
            .get(PRIMARY_KEY)
            .ok_or(DbmsError::RowWithoutPrimaryKey)?
            .to_string();

        let (start, end) = self.base.append_record(table, row, false)?;
        self.index_mut(table)?.set(&key, start, end);
        Ok(())
    }

    /// The point-lookup path for a top-level `id = <literal>` predicate.
    fn lookup_query(
        &self,
        table: &str,
        clause: &WhereClause,
        raw_key: &str,
    ) -> Result<QueryResult, DbmsError> {
        let started = Instant::now();

        let log = self.base.open_log(table)?;
        let key = strip_single_quotes(raw_key);

        let (start, end) = match self.index(table)?.get(key) {
            Ok(range) => range,
            // Key-not-found stays internal: the user sees an empty result.
            Err(IndexError::KeyNotFound(_)) => {
                return Ok(QueryResult::with_timing(Vec::new(), started.elapsed()));
            }
            Err(e) => return Err(e.into()),
        };

        trace!("Index hit for {:?} at [{}, {})", key, start, end);
        let record = log.read_range(start, end)?;

        // Re-apply the predicate; trivially true here, but the record came
        // off disk fully decoded, so a missing column is corruption.
        if !filter::matches_strict(clause, &record)? {
            return Ok(QueryResult::with_timing(Vec::new(), started.elapsed()));
        }

        Ok(QueryResult::with_timing(
            vec![record.row],
            started.elapsed(),
        ))
    }
}

// ------------------------------------------------------------------------------------------------
// Dbms implementation
// ------------------------------------------------------------------------------------------------

impl Dbms for IndexedDbms {
    fn create_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        self.base.create_database(name)
    }

    fn show_databases(&self) -> Result<QueryResult, DbmsError> {
        self.base.show_databases()
    }

    fn drop_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        let was_selected = self.base.current_database() == Some(name);
        let result = self.base.drop_database(name)?;

        if was_selected {
            self.indexes.clear();
        }
        Ok(result)
    }

    fn use_database(&mut self, name: &str) -> Result<QueryResult, DbmsError> {
        let result = self.base.use_database(name)?;

        self.indexes.clear();
        for table in self.base.list_tables()? {
            let log = self.base.open_log(&table)?;
            let index = HashIndex::from_log(&log)?;
            self.indexes.insert(table, index);
        }

        info!(
            "Rebuilt {} table indexes for database {:?}",
            self.indexes.len(),
            name
        );
        Ok(result)
    }

    fn show_tables(&self) -> Result<QueryResult, DbmsError> {
        self.base.show_tables()
    }

    fn create_table(
        &mut self,
        table: &str,
        columns: Option<Vec<String>>,
    ) -> Result<QueryResult, DbmsError> {
        let result = self.base.create_table(table, columns)?;
        self.indexes.insert(table.to_string(), HashIndex::new());
        Ok(result)
    }

    fn drop_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        let result = self.base.drop_table(table)?;
        self.indexes.remove(table);
        Ok(result)
    }

    fn insert(&mut self, table: &str, row: Row) -> Result<QueryResult, DbmsError> {
        self.base.require_table_exists(table)?;
        self.append_live(table, &row)?;
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

        let matching = self.query(table, where_clause)?.rows;
        for row in matching {
            let mut updated = row;
            for (column, value) in set_clause.iter() {
                updated.set(column, value);
            }
            self.append_live(table, &updated)?;
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
            let key = row
                .get(PRIMARY_KEY)
                .ok_or_else(|| DbmsError::CorruptRecord(PRIMARY_KEY.to_string()))?
                .to_string();

            self.base.append_record(table, &row, true)?;
            self.index_mut(table)?.remove(&key);
        }

        Ok(QueryResult::ok())
    }

    fn query(
        &self,
        table: &str,
        where_clause: Option<&WhereClause>,
    ) -> Result<QueryResult, DbmsError> {
        if let Some(clause) = where_clause
            && let Some(raw_key) = clause.equals_on(PRIMARY_KEY)
        {
            return self.lookup_query(table, clause, raw_key);
        }

        self.base.scan_query(table, where_clause)
    }

    fn compact_table(&mut self, table: &str) -> Result<QueryResult, DbmsError> {
        let result = self.base.compact_table(table)?;

        let log = self.base.open_log(table)?;
        let index = HashIndex::from_log(&log)?;
        self.indexes.insert(table.to_string(), index);

        Ok(result)
    }
}
