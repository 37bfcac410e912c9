//! Local SQLite store for StreamWatcher: user settings and the saved
//! Twitch credential row.

pub mod credentials;
pub mod schema;
pub mod settings;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// File name of the store inside the data directory.
pub const DB_FILE_NAME: &str = "local.db";

/// Cloneable handle to the store. All clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open `local.db` inside `dir`, creating the directory when missing.
    pub fn open_in(dir: impl AsRef<Path>) -> Result<(Self, PathBuf), DbError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| DbError::DataDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(DB_FILE_NAME);
        let db = Self::open(&path)?;
        Ok((db, path))
    }

    /// Open or create a store file. The journal is switched to WAL.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )?;
        tracing::debug!("Opened store at {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    /// Fresh store that lives only as long as the handle.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with the connection locked.
    pub fn with_conn<F, R>(&self, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&Connection) -> Result<R, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot create data directory {}: {source}", path.display())]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
