//! Move validation: may the player step from here to there?
//!
//! The link set is always re-derived from the link graph for the session's
//! current article. Nothing the client claims about what it rendered counts.

use tracing::debug;

use crate::links::{LinkError, LinkGraph};
use crate::model::{ArticleId, GameSession};

/// Product rules that shape which moves are allowed.
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// Whether the player may step back onto an article already in the path.
    pub allow_revisits: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            allow_revisits: true,
        }
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("already on that article")]
    SelfLoop,

    #[error("no link to that article from the current one")]
    NotLinked,

    #[error("that article was already visited")]
    Revisit,
}

/// Whether `current` links to `next`.
///
/// Self-loops are never legal, even when an article links to itself.
pub fn is_legal_move<G: LinkGraph + ?Sized>(
    links: &G,
    current: ArticleId,
    next: ArticleId,
) -> Result<bool, LinkError> {
    if next == current {
        return Ok(false);
    }
    Ok(links.outbound_links(current)?.contains(&next))
}

/// Check a proposed move for an active session.
///
/// The outer error is a lookup failure; the inner one a refused move.
pub fn check_move<G: LinkGraph + ?Sized>(
    links: &G,
    rules: Rules,
    session: &GameSession,
    next: ArticleId,
) -> Result<Result<(), MoveRejection>, LinkError> {
    let current = session.current();
    let verdict = if next == current {
        Err(MoveRejection::SelfLoop)
    } else if !is_legal_move(links, current, next)? {
        Err(MoveRejection::NotLinked)
    } else if !rules.allow_revisits && session.has_visited(next) {
        Err(MoveRejection::Revisit)
    } else {
        Ok(())
    };
    debug!(session = %session.id, %current, %next, ?verdict, "checked move");
    Ok(verdict)
}
