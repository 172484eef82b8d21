#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use hearth_storage_json::{JsonHouseholdStore, StoragePaths};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the test function.
pub fn test_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn open_store(home: &Path) -> JsonHouseholdStore {
    JsonHouseholdStore::new(StoragePaths::under(home)).expect("open json store")
}

/// The CLI in script mode with its home and "today" pinned.
pub fn cli(home: &Path, today: &str) -> Command {
    let mut cmd = Command::cargo_bin("hearth_cli").expect("hearth_cli binary");
    cmd.env("HEARTH_HOME", home)
        .env("HEARTH_TODAY", today)
        .env("HEARTH_CLI_SCRIPT", "1")
        .env_remove("RUST_LOG");
    cmd
}
