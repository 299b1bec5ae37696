#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

pub use libsql_dialect::config::database_url as db_url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
}

pub fn setup() -> TempDir {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("libsql_dialect=debug")
        .with_test_writer()
        .try_init();
    tempfile::Builder::new()
        .prefix("libsql-")
        .tempdir()
        .expect("create temp dir")
}

/// Removes the temp dir and everything in it, failing the test on residue.
pub fn teardown(dir: TempDir) {
    let path = dir.path().to_path_buf();
    dir.close().expect("remove temp dir");
    assert!(!path.exists(), "{} still exists after teardown", path.display());
}

pub fn file_dsn(dir: &Path, name: &str) -> String {
    format!("file:{}", dir.join(name).display())
}

pub fn db_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

pub fn unique_table() -> String {
    format!("foo_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

pub fn unique_id() -> i64 {
    Utc::now().timestamp_millis()
}
