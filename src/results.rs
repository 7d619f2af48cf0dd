//! Final results for a finished game.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::GameError;
use crate::model::{GameSession, SessionStatus};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Completed,
    Forfeited,
}

/// The scored record of a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub session_id: Uuid,
    pub clicks: usize,
    pub path_length: usize,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

impl GameResult {
    /// Derive the result of a terminal session.
    ///
    /// Pure: the same session always yields the same result. Active sessions
    /// have no result yet.
    pub fn from_session(session: &GameSession) -> Result<Self, GameError> {
        let (outcome, at) = match session.status {
            SessionStatus::Active => {
                return Err(GameError::InvalidArgument(format!(
                    "game {} is still in progress",
                    session.id
                )));
            }
            SessionStatus::Completed { at } => (Outcome::Completed, at),
            SessionStatus::Forfeited { at } => (Outcome::Forfeited, at),
        };

        // A clock that stepped backwards yields zero, not a negative time.
        let elapsed_ms = u64::try_from(at.duration_since(session.started_at).as_millis()).unwrap_or(0);

        Ok(Self {
            session_id: session.id,
            clicks: session.clicks(),
            path_length: session.path.len(),
            elapsed_ms,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::model::ArticleId;

    fn started_session() -> GameSession {
        GameSession::new(
            "alice",
            ArticleId::for_slug("dog"),
            ArticleId::for_slug("animal"),
            Timestamp::new(1_000_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn completed_game_result() {
        let mut session = started_session();
        session.advance(ArticleId::for_slug("wolf"), Timestamp::new(1_000_000_010, 0).unwrap());
        session.advance(session.end, Timestamp::new(1_000_000_042, 500_000_000).unwrap());

        let result = GameResult::from_session(&session).unwrap();

        assert_eq!(result.outcome, Outcome::Completed);
        assert_eq!(result.clicks, 2);
        assert_eq!(result.path_length, 3);
        assert_eq!(result.elapsed_ms, 42_500);
        assert_eq!(result.session_id, session.id);
    }

    #[test]
    fn forfeited_game_result() {
        let mut session = started_session();
        session.forfeit(Timestamp::new(1_000_000_005, 0).unwrap());

        let result = GameResult::from_session(&session).unwrap();

        assert_eq!(result.outcome, Outcome::Forfeited);
        assert_eq!(result.clicks, 0);
        assert_eq!(result.path_length, 1);
        assert_eq!(result.elapsed_ms, 5_000);
    }

    #[test]
    fn result_is_repeatable() {
        let mut session = started_session();
        session.forfeit(Timestamp::new(1_000_000_005, 0).unwrap());

        assert_eq!(
            GameResult::from_session(&session).unwrap(),
            GameResult::from_session(&session).unwrap()
        );
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let mut session = started_session();
        session.forfeit(Timestamp::new(999_999_000, 0).unwrap());

        assert_eq!(GameResult::from_session(&session).unwrap().elapsed_ms, 0);
    }

    #[test]
    fn active_game_has_no_result() {
        let err = GameResult::from_session(&started_session()).unwrap_err();
        assert!(matches!(err, GameError::InvalidArgument(_)));
    }
}
