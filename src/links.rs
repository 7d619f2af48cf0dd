//! The link graph the game is played on.
//!
//! The game never owns content. It asks a [`LinkGraph`] two questions:
//! which article a slug names, and which articles a given article links to.

use std::collections::BTreeSet;

use percent_encoding::percent_decode_str;

use crate::model::{ArticleId, normalize_slug};

/// Errors from a link graph lookup.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("no article for slug '{0}'")]
    SlugNotFound(String),

    #[error("no article with id {0}")]
    ArticleNotFound(ArticleId),

    /// The content source could not be read. Safe to retry.
    #[error("content unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the outbound-link relationships between articles.
///
/// Implementations must answer from live content: `outbound_links` is asked
/// on every move and its answer is the only thing that makes a move legal.
pub trait LinkGraph {
    /// Resolve a slug to the canonical article it names.
    fn resolve_slug(&self, slug: &str) -> Result<ArticleId, LinkError>;

    /// Every article `article` links to, with link targets already resolved
    /// to canonical identities.
    fn outbound_links(&self, article: ArticleId) -> Result<BTreeSet<ArticleId>, LinkError>;
}

/// Extract the slug from an internal content link, if `href` is one.
///
/// Internal links look like `/wiki/<slug>`, `wiki/<slug>`, `./<slug>`,
/// `<slug>.md`, or a bare `<slug>`, possibly percent-encoded. Fragments and
/// query strings are ignored.
/// External URLs, in-page anchors, and other site paths are not internal.
pub fn internal_slug(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("//") {
        return None;
    }
    if href.contains("://") || href.starts_with("mailto:") {
        return None;
    }

    let href = href.split(['#', '?']).next().unwrap_or_default();
    let slug = if let Some(rest) = href.strip_prefix("/wiki/") {
        rest
    } else if let Some(rest) = href.strip_prefix("wiki/") {
        rest
    } else if let Some(rest) = href.strip_prefix("./") {
        rest
    } else if href.starts_with('/') {
        return None;
    } else {
        href
    };
    let decoded = percent_decode_str(slug).decode_utf8().ok()?;
    let slug = decoded.strip_suffix(".md").unwrap_or(&*decoded);

    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some(normalize_slug(slug))
}
