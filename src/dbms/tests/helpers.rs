use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::dbms::{AppendOnlyDbms, Dbms, IndexedDbms};
use crate::record::Row;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An append-only DBMS with database `test_db` created and selected.
pub fn open_append_only(root: &Path) -> AppendOnlyDbms {
    init_tracing();
    let mut dbms = AppendOnlyDbms::new(root).unwrap();
    dbms.create_database("test_db").unwrap();
    dbms.use_database("test_db").unwrap();
    dbms
}

/// An indexed DBMS with database `test_db` created and selected.
pub fn open_indexed(root: &Path) -> IndexedDbms {
    init_tracing();
    let mut dbms = IndexedDbms::new(root).unwrap();
    dbms.create_database("test_db").unwrap();
    dbms.use_database("test_db").unwrap();
    dbms
}

/// Creates a `users (id, name, age)` table.
pub fn create_users_table(dbms: &mut (impl Dbms + ?Sized)) {
    dbms.create_table(
        "users",
        Some(vec![
            "id".to_string(),
            "name".to_string(),
            "age".to_string(),
        ]),
    )
    .unwrap();
}

/// A `users` row.
pub fn user(id: &str, name: &str, age: &str) -> Row {
    Row::from_pairs([("id", id), ("name", name), ("age", age)])
}

/// Bare names out of a SHOW result's single-cell rows.
pub fn names(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.iter().map(|(_, v)| v.to_string()))
        .collect()
}
