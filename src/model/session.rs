//! Game sessions: one player's attempt to walk from a start article to an end article.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ArticleId;

/// An in-progress or finished traversal attempt.
///
/// `path` always starts with `start` and only ever grows. The current
/// article and the click count are derived from it, so they cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: Uuid,
    pub player: String,
    pub start: ArticleId,
    pub end: ArticleId,
    pub path: Vec<ArticleId>,
    pub status: SessionStatus,
    pub started_at: Timestamp,

    /// Bumped by the store on every successful save.
    pub version: u64,
}

/// Where a session stands in its lifecycle.
///
/// `Completed` and `Forfeited` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionStatus {
    /// The player is still navigating.
    Active,

    /// The player reached the end article.
    Completed { at: Timestamp },

    /// The player gave up.
    Forfeited { at: Timestamp },
}

impl SessionStatus {
    /// Short lowercase label, also used as the stored column value.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed { .. } => "completed",
            Self::Forfeited { .. } => "forfeited",
        }
    }
}

impl GameSession {
    /// Starts a fresh, unsaved session standing on `start`.
    pub fn new(player: &str, start: ArticleId, end: ArticleId, started_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            player: player.to_string(),
            start,
            end,
            path: vec![start],
            status: SessionStatus::Active,
            started_at,
            version: 0,
        }
    }

    /// The article the player is standing on.
    pub fn current(&self) -> ArticleId {
        // `path` is never empty: it is seeded with `start` and append-only.
        *self.path.last().unwrap_or(&self.start)
    }

    /// Number of moves made so far.
    pub fn clicks(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }

    /// When the session left `Active`, if it has.
    pub fn completed_at(&self) -> Option<Timestamp> {
        match self.status {
            SessionStatus::Active => None,
            SessionStatus::Completed { at } | SessionStatus::Forfeited { at } => Some(at),
        }
    }

    /// Whether `article` already appears in the path.
    pub fn has_visited(&self, article: ArticleId) -> bool {
        self.path.contains(&article)
    }

    /// Step onto `next`, completing the session if it is the end article.
    ///
    /// Callers check `is_active` and legality first; this only records the step.
    pub fn advance(&mut self, next: ArticleId, at: Timestamp) {
        debug_assert!(self.is_active(), "advance on a terminal session");
        self.path.push(next);
        if next == self.end {
            self.status = SessionStatus::Completed { at };
        }
    }

    /// Give up on an active session.
    pub fn forfeit(&mut self, at: Timestamp) {
        debug_assert!(self.is_active(), "forfeit on a terminal session");
        self.status = SessionStatus::Forfeited { at };
    }
}
