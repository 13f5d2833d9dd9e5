//! # DumbDB
//!
//! An educational single-node relational engine built on a
//! **log-structured, append-only** storage core. Rows are never mutated in
//! place: updates and deletes are materialized as freshly appended records,
//! deletes carrying a tombstone flag. An in-memory hash index maps primary
//! keys to byte ranges in the log, turning point lookups into one seek plus
//! one bounded read. A small SQL dialect sits on top.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      Engine                           │
//! │                                                       │
//! │  SQL text ──► Tokenizer ──► Parser ──► Statement      │
//! │                                          │            │
//! │                                          ▼            │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │            Storage (Dbms variants)              │  │
//! │  │  ┌───────────────┐      ┌────────────────────┐  │  │
//! │  │  │ AppendOnlyDbms│      │    IndexedDbms     │  │  │
//! │  │  │  (scan path)  │      │ + per-table        │  │  │
//! │  │  │               │      │   HashIndex        │  │  │
//! │  │  └──────┬────────┘      └─────────┬──────────┘  │  │
//! │  │         │        TableLog         │             │  │
//! │  │         └─────► (append-only ◄────┘             │  │
//! │  │                  CSV file)                      │  │
//! │  └─────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | Top-level engine — parse, dispatch, execute, result envelope |
//! | [`dbms`] | Catalog state and table operations for both storage flavors |
//! | [`parser`] | Tokenizer, grammar combinators, statement parsers, AST |
//! | [`log`] | Append-only table log with byte-offset bookkeeping |
//! | [`index`] | Primary-key → byte-range hash index, rebuildable from the log |
//! | [`record`] | Row type and the CSV record codec with tombstone flags |
//!
//! ## Key Properties
//!
//! - **Append-only logs** — every insert, update, and delete is a new
//!   record at the end of the table file; the last non-tombstoned record
//!   per primary key wins.
//! - **Hash-indexed point lookups** — `WHERE id = <literal>` resolves to a
//!   single bounded read, independent of table size.
//! - **Rebuildable indexes** — the index is derived state; replaying the
//!   log always reconstructs it exactly.
//! - **Compaction** — rewrites a log to the last live record per key and
//!   rebuilds the index from the new file. Idempotent.
//! - **Single-threaded by design** — one statement at a time, synchronous
//!   file I/O, no transactions and no crash-recovery log.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dumbdb::engine::{Engine, EngineConfig, StorageKind};
//!
//! let config = EngineConfig {
//!     storage: StorageKind::Indexed,
//! };
//! let mut engine = Engine::open("/tmp/dumbdb-data", config).unwrap();
//!
//! engine.execute("CREATE DATABASE shop;").unwrap();
//! engine.execute("USE shop;").unwrap();
//! engine.execute("CREATE TABLE users (id, name, age);").unwrap();
//! engine.execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);").unwrap();
//!
//! let result = engine.execute("SELECT * FROM users WHERE id = 1;").unwrap();
//! assert_eq!(result.rows.len(), 1);
//! ```

pub mod dbms;
pub mod engine;
pub mod index;
pub mod log;
pub mod parser;
pub mod record;
