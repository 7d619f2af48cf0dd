//! Navigation interception: turning clicks into moves.
//!
//! While a game is active, a click on an internal link inside article
//! content is a move request rather than ordinary navigation. Both decisions
//! here are free of side effects: feed them a click and the current state,
//! read back what should happen.

use uuid::Uuid;

use crate::game::GameError;
use crate::links::{LinkGraph, internal_slug};
use crate::model::{ArticleId, GameSession};

/// A user's click on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    /// The link target as rendered.
    pub href: String,

    /// Whether the click landed inside the article body, not site chrome.
    pub in_content: bool,

    /// Whether a modifier asked for a new tab or window.
    pub modified: bool,
}

impl Click {
    /// A plain click inside article content.
    pub fn in_content(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            in_content: true,
            modified: false,
        }
    }
}

/// What to do with a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationIntent {
    /// Send a move to the game instead of navigating.
    Move { session_id: Uuid, next: ArticleId },

    /// Navigate as usual.
    PassThrough { href: String },
}

/// Where to go once a move request has been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The game is won: show its results.
    Results { session_id: Uuid },

    /// Keep playing from this article.
    Article { id: ArticleId },

    /// The move failed: stay put and tell the user why.
    Stay { message: String },
}

/// Decide whether a click is a move.
///
/// Anything that cannot be turned into a move falls through to ordinary
/// navigation, including slugs that fail to resolve.
pub fn intercept<G: LinkGraph + ?Sized>(
    click: &Click,
    session: Option<&GameSession>,
    links: &G,
) -> NavigationIntent {
    match session.filter(|s| s.is_active()) {
        Some(session) => intercept_in_game(click, session, links),
        None => NavigationIntent::PassThrough {
            href: click.href.clone(),
        },
    }
}

/// Decide whether a click is a move in a game the user named explicitly.
///
/// Unlike [`intercept`], a finished game still receives the move, so the
/// user hears that the game is over instead of being quietly navigated away.
pub fn intercept_in_game<G: LinkGraph + ?Sized>(
    click: &Click,
    session: &GameSession,
    links: &G,
) -> NavigationIntent {
    let pass = || NavigationIntent::PassThrough {
        href: click.href.clone(),
    };

    if !click.in_content || click.modified {
        return pass();
    }
    let Some(slug) = internal_slug(&click.href) else {
        return pass();
    };
    match links.resolve_slug(&slug) {
        Ok(next) => NavigationIntent::Move {
            session_id: session.id,
            next,
        },
        Err(_) => pass(),
    }
}

/// Decide where to go after a move request.
pub fn route_after_move(result: &Result<GameSession, GameError>) -> Route {
    match result {
        Ok(session) if session.is_active() => Route::Article {
            id: session.current(),
        },
        Ok(session) => Route::Results {
            session_id: session.id,
        },
        Err(e) if e.is_transient() => Route::Stay {
            message: "The game is temporarily unavailable. Please try again later.".into(),
        },
        Err(e) => Route::Stay {
            message: e.to_string(),
        },
    }
}
