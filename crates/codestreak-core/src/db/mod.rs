//! SQLite-backed storage.
//!
//! Runtime defaults are conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer commits
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `synchronous = NORMAL`, which is durable under WAL

pub mod kv;
pub mod migrations;
pub mod schema;

pub use kv::SqliteStore;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for store DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create store directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open store database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;

    tracing::debug!(path = %path.display(), "opened store database");
    Ok(SqliteStore::from_connection(conn))
}

/// Open the store if the database file exists, without creating it.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or migrated.
pub fn try_open_store(path: &Path) -> Result<Option<SqliteStore>> {
    if !path.exists() {
        return Ok(None);
    }
    open_store(path).map(Some)
}

/// Open a private in-memory store database (tests, dry runs).
///
/// # Errors
///
/// Returns an error if SQLite cannot create or migrate the database.
pub fn open_in_memory() -> Result<SqliteStore> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(SqliteStore::from_connection(conn))
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, open_store, try_open_store};
    use crate::db::migrations;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested/codestreak.db");
        (dir, path)
    }

    #[test]
    fn open_store_sets_wal_and_busy_timeout() {
        let (_dir, path) = temp_db_path();
        let store = open_store(&path).expect("open store db");

        store
            .with_connection(|conn| {
                let journal_mode: String =
                    conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
                assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

                let busy_timeout_ms: u64 =
                    conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;
                assert_eq!(
                    u128::from(busy_timeout_ms),
                    DEFAULT_BUSY_TIMEOUT.as_millis()
                );
                Ok(())
            })
            .expect("inspect connection");
    }

    #[test]
    fn open_store_runs_migrations() {
        let (_dir, path) = temp_db_path();
        let store = open_store(&path).expect("open store db");

        let version = store
            .with_connection(migrations::current_schema_version)
            .expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn try_open_store_does_not_create_missing_files() {
        let (_dir, path) = temp_db_path();
        assert!(try_open_store(&path).expect("open attempt").is_none());
        assert!(!path.exists());
    }
}
