use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::dbms::StorageKind;
use crate::engine::{Engine, EngineConfig};

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times — only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An indexed engine over `root`.
pub fn open_engine(root: &Path) -> Engine {
    init_tracing();
    Engine::open(root, EngineConfig::default()).unwrap()
}

/// An append-only (scan-path) engine over `root`.
pub fn open_append_only_engine(root: &Path) -> Engine {
    init_tracing();
    Engine::open(
        root,
        EngineConfig {
            storage: StorageKind::AppendOnly,
        },
    )
    .unwrap()
}

/// An engine with a database and a `users (id, name, age)` table ready.
pub fn engine_with_users(root: &Path) -> Engine {
    let mut engine = open_engine(root);
    engine.execute("CREATE DATABASE test_db;").unwrap();
    engine.execute("USE test_db;").unwrap();
    engine
        .execute("CREATE TABLE users (id, name, age);")
        .unwrap();
    engine
}
