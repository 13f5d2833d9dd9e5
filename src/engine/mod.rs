//! # Engine Module
//!
//! The top of the stack: one [`Engine`] instance owns a data directory, a
//! storage flavor, and the query front-end. A statement string flows
//! through the tokenizer and parser into a typed
//! [`Statement`](crate::parser::ast::Statement), and the executor
//! dispatches it — one exhaustive match, one storage call per arm, no
//! reordering, no optimization.
//!
//! ## Result envelope
//!
//! Every statement produces a [`QueryResult`]: status, rows, elapsed
//! time, message. [`Engine::execute`] surfaces failures as typed
//! [`EngineError`]s; [`Engine::run`] folds them into an error envelope
//! for surfaces that print results.
//!
//! ## Execution model
//!
//! Single-threaded, one statement at a time, synchronous file I/O. The
//! engine assumes exclusive ownership of its data directory for the
//! lifetime of the process.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests;

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::path::Path;

use thiserror::Error;
use tracing::{info, trace};

use crate::dbms::{AppendOnlyDbms, Dbms, DbmsError, IndexedDbms, QueryResult, Storage};

pub use crate::dbms::StorageKind;
use crate::parser::ast::{Statement, unquote};
use crate::parser::tokenizer::Tokenizer;
use crate::parser::{ParseError, Parser};
use crate::record::Row;

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors surfaced by [`Engine::execute`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tokenizer or parser failure.
    #[error("Syntax error: {0}")]
    Parse(#[from] ParseError),

    /// Catalog, semantics, or storage failure.
    #[error("{0}")]
    Dbms(#[from] DbmsError),
}

// ------------------------------------------------------------------------------------------------
// Configuration
// ------------------------------------------------------------------------------------------------

/// Configuration for an [`Engine`] instance. Passed to [`Engine::open`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Storage flavor backing this engine instance.
    pub storage: StorageKind,
}

// ------------------------------------------------------------------------------------------------
// Engine
// ------------------------------------------------------------------------------------------------

/// The main engine handle: data directory, storage flavor, and the
/// query front-end.
pub struct Engine {
    storage: Storage,
    tokenizer: Tokenizer,
    parser: Parser,
}

impl Engine {
    /// Opens (or creates) an engine rooted at the given directory.
    ///
    /// On a fresh directory the root is created; databases and tables are
    /// only created by executing statements. No database is selected at
    /// startup.
    pub fn open<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self, EngineError> {
        let storage = match config.storage {
            StorageKind::AppendOnly => Storage::AppendOnly(AppendOnlyDbms::new(&path)?),
            StorageKind::Indexed => Storage::Indexed(IndexedDbms::new(&path)?),
        };

        info!(
            "Opened engine at {} (storage: {:?})",
            path.as_ref().display(),
            config.storage
        );

        Ok(Self {
            storage,
            tokenizer: Tokenizer::new(),
            parser: Parser::new(),
        })
    }

    /// The storage behind this engine. Test and tooling hook.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Executes one statement string: tokenize, parse, dispatch.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult, EngineError> {
        trace!("Executing statement: {}", sql);

        let tokens = self.tokenizer.tokenize(sql)?;
        let statement = self.parser.parse(&tokens)?;

        Ok(self.execute_statement(statement)?)
    }

    /// Executes one statement string, folding failures into an error
    /// envelope instead of returning them.
    pub fn run(&mut self, sql: &str) -> QueryResult {
        match self.execute(sql) {
            Ok(result) => result,
            Err(e) => QueryResult::error(e.to_string()),
        }
    }

    /// Compacts a table's log down to the last live record per primary
    /// key. Maintenance operation — the dialect has no statement for it.
    pub fn compact_table(&mut self, table: &str) -> Result<QueryResult, EngineError> {
        Ok(self.storage.compact_table(table)?)
    }

    /// The executor: a closed switch over statement variants, each arm
    /// calling exactly one storage method.
    fn execute_statement(&mut self, statement: Statement) -> Result<QueryResult, DbmsError> {
        match statement {
            Statement::CreateDatabase { name } => self.storage.create_database(&name),
            Statement::ShowDatabases => self.storage.show_databases(),
            Statement::DropDatabase { name } => self.storage.drop_database(&name),
            Statement::UseDatabase { name } => self.storage.use_database(&name),

            Statement::CreateTable { table, columns } => {
                self.storage.create_table(&table, Some(columns))
            }
            Statement::ShowTables => self.storage.show_tables(),
            Statement::DropTable { table } => self.storage.drop_table(&table),

            // The column list is parsed but not projected; result rows
            // always carry every column.
            Statement::Select {
                columns: _,
                table,
                where_clause,
            } => self.storage.query(&table, where_clause.as_ref()),

            Statement::Insert {
                table,
                columns,
                values,
            } => {
                let row = Row::from_pairs(
                    columns
                        .into_iter()
                        .zip(values.iter().map(|v| unquote(v).to_string())),
                );
                self.storage.insert(&table, row)
            }

            Statement::Update {
                table,
                set_clause,
                where_clause,
            } => {
                let set_clause = Row::from_pairs(set_clause.into_iter().map(|(column, value)| {
                    let value = unquote(&value).to_string();
                    (column, value)
                }));
                self.storage
                    .update(&table, &set_clause, where_clause.as_ref())
            }

            Statement::Delete {
                table,
                where_clause,
            } => self.storage.delete(&table, where_clause.as_ref()),
        }
    }
}
