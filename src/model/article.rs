//! Article identity and slugs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving article identities from canonical slugs.
const ARTICLE_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_7a0b_52d4_4c6e_9f0a_3b8d_21e4_7c55);

/// Stable identity of an article.
///
/// Derived from the canonical slug, so the same article keeps the same id
/// across restarts and across machines that share the same content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(Uuid);

impl ArticleId {
    /// The identity of the article whose canonical slug is `slug`.
    ///
    /// The slug is normalized first, so `"Red Fox"` and `"red-fox"` agree.
    pub fn for_slug(slug: &str) -> Self {
        Self(Uuid::new_v5(&ARTICLE_NAMESPACE, normalize_slug(slug).as_bytes()))
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArticleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A unit of content: identity, slug, and a human-readable title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub slug: String,
    pub title: String,
}

/// Normalize a slug: trimmed, lowercase, spaces and underscores become `-`.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim()
        .chars()
        .map(|c| match c {
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
