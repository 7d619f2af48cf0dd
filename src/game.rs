//! The game controller: the only place sessions change.
//!
//! ```text
//! Active --move (reaches end)--> Completed
//! Active --move (elsewhere)----> Active      (path grows)
//! Active --forfeit-------------> Forfeited
//! ```
//!
//! `Completed` and `Forfeited` are absorbing: moves fail, forfeits are no-ops.
//! Every write is a versioned save, so a lost race surfaces as
//! [`GameError::ConcurrentModification`] instead of a silent overwrite.

use jiff::Timestamp;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::links::{LinkError, LinkGraph};
use crate::model::{ArticleId, GameSession};
use crate::storage::{Storage, StorageError};
use crate::validate::{MoveRejection, Rules, check_move};

/// Errors surfaced to whoever drives the game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("player '{0}' already has an active game; forfeit or finish it first")]
    Conflict(String),

    #[error("game {0} is already over")]
    SessionTerminal(Uuid),

    #[error("move rejected: {0}")]
    InvalidMove(MoveRejection),

    #[error("game {0} changed while the move was being made; reload and try again")]
    ConcurrentModification(Uuid),

    /// Store or content source unavailable. Safe to retry with backoff.
    #[error("temporarily unavailable: {0}")]
    Transient(String),

    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl GameError {
    /// Whether the failure is infrastructure rather than a game rule.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<StorageError> for GameError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::SessionNotFound(id) => Self::NotFound(format!("game {id}")),
            StorageError::ActiveSessionExists(player) => Self::Conflict(player),
            StorageError::ConcurrentModification { id, .. } => Self::ConcurrentModification(id),
            e if e.is_transient() => Self::Transient(e.to_string()),
            e => Self::Storage(e),
        }
    }
}

impl From<LinkError> for GameError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::SlugNotFound(slug) => Self::NotFound(format!("article '{slug}'")),
            LinkError::ArticleNotFound(id) => Self::NotFound(format!("article {id}")),
            LinkError::Unavailable(msg) => Self::Transient(msg),
        }
    }
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Drives sessions through their lifecycle against a store and a link graph.
pub struct Game<'a, G: ?Sized> {
    storage: &'a Storage,
    links: &'a G,
    rules: Rules,
}

impl<'a, G: LinkGraph + ?Sized> Game<'a, G> {
    pub fn new(storage: &'a Storage, links: &'a G, rules: Rules) -> Self {
        Self {
            storage,
            links,
            rules,
        }
    }

    /// Start a new game for `player`.
    ///
    /// Fails with `Conflict` if the player already has an active game.
    pub fn create_game(&self, player: &str, start: ArticleId, end: ArticleId) -> Result<GameSession> {
        if player.trim().is_empty() {
            return Err(GameError::InvalidArgument("a player identity is required".into()));
        }
        if start == end {
            return Err(GameError::InvalidArgument(
                "start and end must be different articles".into(),
            ));
        }
        // Both ends must be real articles.
        self.links.outbound_links(start)?;
        self.links.outbound_links(end)?;

        let session = GameSession::new(player, start, end, Timestamp::now());
        self.storage.insert_session(&session)?;
        info!(session = %session.id, player, %start, %end, "game created");
        Ok(session)
    }

    /// The player's active game, if any. Read only.
    pub fn active_game(&self, player: &str) -> Result<Option<GameSession>> {
        Ok(self.storage.load_active_session(player)?)
    }

    /// Any session by id, active or not.
    pub fn session(&self, id: Uuid) -> Result<GameSession> {
        Ok(self.storage.load_session(id)?)
    }

    /// A session by id as seen by `player`.
    ///
    /// Another player's game is reported as not found, exactly like a game
    /// that does not exist.
    pub fn player_session(&self, player: &str, id: Uuid) -> Result<GameSession> {
        let session = self.storage.load_session(id)?;
        if session.player != player {
            debug!(session = %id, player, "game belongs to another player");
            return Err(GameError::NotFound(format!("game {id}")));
        }
        Ok(session)
    }

    /// Every game the player has played, newest first.
    pub fn history(&self, player: &str) -> Result<Vec<GameSession>> {
        Ok(self.storage.list_sessions(player)?)
    }

    /// Step from the session's current article onto `next`.
    ///
    /// Reaching the end article completes the game. If someone else saved
    /// the session after it was loaded, nothing is written and
    /// `ConcurrentModification` is returned.
    pub fn make_move(&self, session_id: Uuid, next: ArticleId) -> Result<GameSession> {
        let session = self.storage.load_session(session_id)?;
        self.apply_move(session, next)
    }

    /// [`Game::make_move`], re-evaluated once against fresh state if it lost a race.
    ///
    /// The retry validates against the reloaded current article, so a move
    /// that was legal before the race may now be rejected.
    pub fn make_move_retrying(&self, session_id: Uuid, next: ArticleId) -> Result<GameSession> {
        match self.make_move(session_id, next) {
            Err(GameError::ConcurrentModification(_)) => {
                warn!(session = %session_id, "concurrent move, re-evaluating once");
                self.make_move(session_id, next)
            }
            other => other,
        }
    }

    fn apply_move(&self, mut session: GameSession, next: ArticleId) -> Result<GameSession> {
        if !session.is_active() {
            return Err(GameError::SessionTerminal(session.id));
        }
        let expected = session.version;
        check_move(self.links, self.rules, &session, next)?.map_err(GameError::InvalidMove)?;

        session.advance(next, Timestamp::now());
        let saved = self.storage.save_session(&session, expected)?;
        info!(
            session = %saved.id,
            clicks = saved.clicks(),
            status = saved.status.label(),
            "move made"
        );
        Ok(saved)
    }

    /// Give up on a game.
    ///
    /// Forfeiting a game that is already over returns it unchanged. If a
    /// concurrent move lands first, the forfeit is re-applied to the fresh
    /// state, which may by then be completed.
    pub fn forfeit_game(&self, session_id: Uuid) -> Result<GameSession> {
        let session = self.storage.load_session(session_id)?;
        match self.try_forfeit(session) {
            Err(GameError::ConcurrentModification(_)) => {
                warn!(session = %session_id, "concurrent change during forfeit, retrying once");
                let session = self.storage.load_session(session_id)?;
                self.try_forfeit(session)
            }
            other => other,
        }
    }

    fn try_forfeit(&self, mut session: GameSession) -> Result<GameSession> {
        if !session.is_active() {
            debug!(session = %session.id, status = session.status.label(), "forfeit on finished game");
            return Ok(session);
        }
        let expected = session.version;
        session.forfeit(Timestamp::now());
        let saved = self.storage.save_session(&session, expected)?;
        info!(session = %saved.id, clicks = saved.clicks(), "game forfeited");
        Ok(saved)
    }
}
