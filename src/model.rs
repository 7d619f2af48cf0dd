//! Core data model for linkrace.
//!
//! Articles are the nodes of the knowledge base; a game session is one
//! player's attempt to walk from a start article to an end article.

mod article;
mod session;

pub use article::{Article, ArticleId, normalize_slug};
pub use session::{GameSession, SessionStatus};
