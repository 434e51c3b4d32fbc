//! SQLite storage for ingested rows.
//!
//! One connection per process, shared behind a mutex. Each dataset has its
//! own repository module; `writer` picks the right one for a record.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod migrations;
pub mod production_repo;
pub mod status_repo;
pub mod writer;

pub use error::DatabaseError;
pub use writer::{upsert, UpsertOutcome};

/// Shared handle to the store. Clones point at the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens `path`, creating missing parent directories, and migrates it.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        // WAL lets the operator inspect the file while the service writes.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let db = Self::from_connection(conn)?;
        log::info!("Using SQLite database {}", path.display());
        Ok(db)
    }

    /// Private, migrated database that disappears with the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Opens the database named by a connection string.
    ///
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, `sqlite::memory:`,
    /// `:memory:` or a bare filesystem path.
    pub fn open_url(url: &str) -> Result<Self, DatabaseError> {
        match parse_database_url(url)? {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => Self::open(&path),
        }
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&guard)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

fn parse_database_url(url: &str) -> Result<DatabaseLocation, DatabaseError> {
    let url = url.trim();
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if rest.is_empty() {
        return Err(DatabaseError::InvalidUrl(url.to_string()));
    }
    if rest == ":memory:" {
        return Ok(DatabaseLocation::Memory);
    }
    if rest.contains("://") {
        return Err(DatabaseError::InvalidUrl(url.to_string()));
    }
    // Drop query options such as `?mode=rwc`.
    let path = rest.split('?').next().unwrap_or(rest);
    Ok(DatabaseLocation::File(PathBuf::from(path)))
}
