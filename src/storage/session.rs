//! Session storage: atomic create, versioned save, and lookups.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, ffi};
use tracing::debug;
use uuid::Uuid;

use crate::model::{ArticleId, GameSession, SessionStatus};

use super::{Result, Storage, StorageError};

const SELECT_SESSION: &str = "SELECT id, player, start_article, end_article, status, started_at, \
     completed_at, version FROM sessions";

impl Storage {
    /// Inserts a new session.
    ///
    /// Fails with `ActiveSessionExists` if the player already has an active
    /// session. The check and the insert are one statement guarded by a
    /// unique index, so two racing inserts cannot both succeed.
    pub fn insert_session(&self, session: &GameSession) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO sessions
                 (id, player, start_article, end_article, status, started_at, completed_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                session.id.to_string(),
                &session.player,
                session.start.to_string(),
                session.end.to_string(),
                session.status.label(),
                session.started_at.to_string(),
                session.completed_at().map(|t| t.to_string()),
                to_i64(session.version)?,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::ActiveSessionExists(session.player.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        insert_moves(&tx, session.id, 0, &session.path, session.started_at)?;
        tx.commit()?;
        debug!(session = %session.id, player = %session.player, "inserted session");
        Ok(())
    }

    /// Saves a modified session if nobody else has saved it since it was loaded.
    ///
    /// `expected_version` is the version the caller loaded. On success the
    /// returned session carries the new version. The stored path must be a
    /// prefix of the new one: steps are only ever appended.
    pub fn save_session(&self, session: &GameSession, expected_version: u64) -> Result<GameSession> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let found = tx
            .query_row(
                "SELECT version FROM sessions WHERE id = ?1",
                [session.id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .ok_or(StorageError::SessionNotFound(session.id))?;
        let found = to_u64(found)?;
        if found != expected_version {
            return Err(StorageError::ConcurrentModification {
                id: session.id,
                expected: expected_version,
                found,
            });
        }

        let stored_path = load_path(&tx, session.id)?;
        if !session.path.starts_with(&stored_path) {
            return Err(StorageError::Corrupt(format!(
                "session {} would rewrite its path",
                session.id
            )));
        }
        let new_steps = &session.path[stored_path.len()..];
        insert_moves(&tx, session.id, stored_path.len(), new_steps, Timestamp::now())?;

        let version = expected_version + 1;
        tx.execute(
            "UPDATE sessions SET status = ?1, completed_at = ?2, version = ?3
             WHERE id = ?4 AND version = ?5",
            rusqlite::params![
                session.status.label(),
                session.completed_at().map(|t| t.to_string()),
                to_i64(version)?,
                session.id.to_string(),
                to_i64(expected_version)?,
            ],
        )?;
        tx.commit()?;
        debug!(session = %session.id, version, steps = new_steps.len(), "saved session");

        let mut saved = session.clone();
        saved.version = version;
        Ok(saved)
    }

    /// Loads a single session.
    ///
    /// The row and its path are read in one transaction, so a concurrent
    /// save is seen either entirely or not at all.
    pub fn load_session(&self, id: Uuid) -> Result<GameSession> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let row = tx
            .query_row(
                &format!("{SELECT_SESSION} WHERE id = ?1"),
                [id.to_string()],
                session_row,
            )
            .optional()?
            .ok_or(StorageError::SessionNotFound(id))?;
        let session = row.into_session(&tx)?;
        tx.commit()?;
        Ok(session)
    }

    /// Loads the player's active session, if any.
    pub fn load_active_session(&self, player: &str) -> Result<Option<GameSession>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let row = tx
            .query_row(
                &format!("{SELECT_SESSION} WHERE player = ?1 AND status = 'active'"),
                [player],
                session_row,
            )
            .optional()?;
        let session = row.map(|r| r.into_session(&tx)).transpose()?;
        tx.commit()?;
        Ok(session)
    }

    /// Lists every session the player has played, newest first.
    pub fn list_sessions(&self, player: &str) -> Result<Vec<GameSession>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(&format!("{SELECT_SESSION} WHERE player = ?1"))?;
            stmt.query_map([player], session_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let mut sessions = rows
            .into_iter()
            .map(|r| r.into_session(&tx))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }
}

/// Raw column values of one `sessions` row.
struct SessionRow {
    id: String,
    player: String,
    start: String,
    end: String,
    status: String,
    started_at: String,
    completed_at: Option<String>,
    version: i64,
}

fn session_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        player: row.get(1)?,
        start: row.get(2)?,
        end: row.get(3)?,
        status: row.get(4)?,
        started_at: row.get(5)?,
        completed_at: row.get(6)?,
        version: row.get(7)?,
    })
}

impl SessionRow {
    /// Parses the row and attaches its path from the `moves` table.
    fn into_session(self, conn: &Connection) -> Result<GameSession> {
        let id = self
            .id
            .parse::<Uuid>()
            .map_err(|e| StorageError::Corrupt(format!("invalid session id: {e}")))?;
        let started_at = parse_timestamp(&self.started_at, "started_at")?;
        let status = deserialize_status(&self.status, self.completed_at.as_deref())?;
        let path = load_path(conn, id)?;
        if path.is_empty() {
            return Err(StorageError::Corrupt(format!("session {id} has no path")));
        }

        Ok(GameSession {
            id,
            player: self.player,
            start: parse_article(&self.start)?,
            end: parse_article(&self.end)?,
            path,
            status,
            started_at,
            version: to_u64(self.version)?,
        })
    }
}

/// Reads a session's path in step order.
fn load_path(conn: &Connection, id: Uuid) -> Result<Vec<ArticleId>> {
    let mut stmt =
        conn.prepare("SELECT article_id FROM moves WHERE session_id = ?1 ORDER BY step")?;
    let ids = stmt
        .query_map([id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.iter().map(|s| parse_article(s)).collect()
}

/// Records path steps starting at `first_step`.
fn insert_moves(
    conn: &Connection,
    id: Uuid,
    first_step: usize,
    articles: &[ArticleId],
    at: Timestamp,
) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO moves (session_id, step, article_id, moved_at) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (offset, article) in articles.iter().enumerate() {
        let step = i64::try_from(first_step + offset)
            .map_err(|_| StorageError::Corrupt("path too long".into()))?;
        stmt.execute(rusqlite::params![
            id.to_string(),
            step,
            article.to_string(),
            at.to_string(),
        ])?;
    }
    Ok(())
}

/// Whether `e` is a `UNIQUE` index violation, as opposed to any other
/// constraint such as a duplicate primary key.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Reconstructs a `SessionStatus` from the status and `completed_at` columns.
fn deserialize_status(status: &str, completed_at: Option<&str>) -> Result<SessionStatus> {
    let at = || {
        let raw = completed_at.ok_or_else(|| {
            StorageError::Corrupt(format!("session is {status} but completed_at is null"))
        })?;
        parse_timestamp(raw, "completed_at")
    };
    match status {
        "active" => Ok(SessionStatus::Active),
        "completed" => Ok(SessionStatus::Completed { at: at()? }),
        "forfeited" => Ok(SessionStatus::Forfeited { at: at()? }),
        other => Err(StorageError::Corrupt(format!(
            "unknown session status: {other}"
        ))),
    }
}

fn parse_timestamp(raw: &str, column: &str) -> Result<Timestamp> {
    raw.parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

fn parse_article(raw: &str) -> Result<ArticleId> {
    raw.parse::<ArticleId>()
        .map_err(|e| StorageError::Corrupt(format!("invalid article id: {e}")))
}

fn to_i64(version: u64) -> Result<i64> {
    i64::try_from(version).map_err(|_| StorageError::Corrupt("version overflow".into()))
}

fn to_u64(version: i64) -> Result<u64> {
    u64::try_from(version).map_err(|_| StorageError::Corrupt("negative version".into()))
}
