//! Output formatting for CLI display.

use std::collections::BTreeSet;

use crate::content::ContentLibrary;
use crate::model::{ArticleId, GameSession, SessionStatus};
use crate::results::{GameResult, Outcome};

/// An article's slug, or its raw id if the content no longer has it.
fn label(id: ArticleId, library: &ContentLibrary) -> String {
    library
        .article(id)
        .map_or_else(|_| id.to_string(), |article| article.slug)
}

fn join_path(path: &[ArticleId], library: &ContentLibrary) -> String {
    path.iter()
        .map(|id| label(*id, library))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Multi-line summary of a session.
pub(super) fn format_session(session: &GameSession, library: &ContentLibrary) -> String {
    let short_id = &session.id.to_string()[..8];
    format!(
        "game {short_id}  [{}]  {} → {}\n  clicks: {}\n  path:   {}",
        session.status.label(),
        label(session.start, library),
        label(session.end, library),
        session.clicks(),
        join_path(&session.path, library),
    )
}

/// One line per game for `history`.
pub(super) fn format_history_line(session: &GameSession, library: &ContentLibrary) -> String {
    let short_id = &session.id.to_string()[..8];
    let clicks = match session.clicks() {
        1 => "1 click".to_string(),
        n => format!("{n} clicks"),
    };
    format!(
        "{short_id}  [{}]  {} → {}  ({clicks})",
        session.status.label(),
        label(session.start, library),
        label(session.end, library),
    )
}

/// The article the player stands on and the links out of it.
pub(super) fn format_article_view(
    article: ArticleId,
    links: &BTreeSet<ArticleId>,
    library: &ContentLibrary,
) -> String {
    let title = library
        .article(article)
        .map_or_else(|_| article.to_string(), |a| format!("{} ({})", a.title, a.slug));
    if links.is_empty() {
        return format!("{title}\n  (no links)");
    }
    let mut slugs: Vec<String> = links.iter().map(|id| label(*id, library)).collect();
    slugs.sort();
    let lines: Vec<String> = slugs.iter().map(|s| format!("  → {s}")).collect();
    format!("{title}\n{}", lines.join("\n"))
}

/// Human-readable results.
pub(super) fn format_result(
    result: &GameResult,
    session: &GameSession,
    library: &ContentLibrary,
) -> String {
    let outcome = match result.outcome {
        Outcome::Completed => "completed",
        Outcome::Forfeited => "forfeited",
    };
    let finished = match session.status {
        SessionStatus::Completed { at } | SessionStatus::Forfeited { at } => at.to_string(),
        SessionStatus::Active => "-".to_string(),
    };
    format!(
        "game {}  [{outcome}]\n  clicks:   {}\n  articles: {}\n  time:     {}\n  finished: {finished}\n  path:     {}",
        &result.session_id.to_string()[..8],
        result.clicks,
        result.path_length,
        format_elapsed(result.elapsed_ms),
        join_path(&session.path, library),
    )
}

/// `m:ss.mmm` for short games, `h:mm:ss` once they pass an hour.
fn format_elapsed(ms: u64) -> String {
    let secs = ms / 1000;
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
    } else {
        format!("{}:{:02}.{:03}", secs / 60, secs % 60, ms % 1000)
    }
}
