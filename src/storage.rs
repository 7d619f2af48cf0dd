//! Local persistence for game sessions.
//!
//! All sessions live in one `SQLite` database under the storage root:
//!
//! ```text
//! <root>/linkrace.sqlite
//!   sessions   # one row per session, with its version stamp
//!   moves      # one row per path step, append-only
//! ```
//!
//! Every call opens its own connection, so independent callers only meet at
//! `SQLite`'s write lock. Waits on that lock are bounded by the busy timeout.

mod session;

use std::path::PathBuf;
use std::time::Duration;
use std::{fs, io};

use rusqlite::{Connection, ErrorCode};
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("player '{0}' already has an active session")]
    ActiveSessionExists(String),

    #[error("session {id} was modified concurrently (expected version {expected}, found {found})")]
    ConcurrentModification { id: Uuid, expected: u64, found: u64 },

    /// The database stayed locked for longer than the busy timeout.
    #[error("database busy: {0}")]
    Busy(String),

    #[error("corrupt session data: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Whether the failure is infrastructure that may clear up on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Io(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Busy(e.to_string()),
            _ => Self::Sqlite(e),
        }
    }
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id            TEXT PRIMARY KEY,
    player        TEXT NOT NULL,
    start_article TEXT NOT NULL,
    end_article   TEXT NOT NULL,
    status        TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    completed_at  TEXT,
    version       INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS one_active_session_per_player
    ON sessions (player) WHERE status = 'active';
CREATE TABLE IF NOT EXISTS moves (
    session_id TEXT NOT NULL REFERENCES sessions (id),
    step       INTEGER NOT NULL,
    article_id TEXT NOT NULL,
    moved_at   TEXT NOT NULL,
    PRIMARY KEY (session_id, step)
);
";

/// Local `SQLite`-backed storage for game sessions.
#[derive(Debug, Clone)]
pub struct Storage {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory and the schema are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>, busy_timeout: Duration) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self {
            db_path: root.join("linkrace.sqlite"),
            busy_timeout,
        };
        storage.connect()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.linkrace/data/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".linkrace").join("data"))
    }

    /// Opens a fresh connection with the busy timeout applied.
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}
