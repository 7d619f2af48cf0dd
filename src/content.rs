//! A directory of Markdown articles, served as a [`LinkGraph`].
//!
//! One file per article, named `<slug>.md`, at any depth under the root:
//!
//! ```text
//! <root>/
//!   dog.md           # "# Dog" heading, body links like [wolves](/wiki/wolf)
//!   animals/wolf.md
//!   canine.md        # "redirect: dog"
//! ```
//!
//! The directory is indexed once when the library is opened. Article bodies
//! are read on every lookup, so the link set always reflects the file on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::{fs, io};

use ignore::WalkBuilder;
use pulldown_cmark::{Event, Parser, Tag};
use tracing::{debug, warn};

use crate::links::{LinkError, LinkGraph, internal_slug};
use crate::model::{Article, ArticleId, normalize_slug};

/// Markdown articles indexed by slug.
pub struct ContentLibrary {
    files: BTreeMap<String, PathBuf>,
    slugs: BTreeMap<ArticleId, String>,
    max_redirects: usize,
}

/// A parsed article file.
#[derive(Debug, PartialEq, Eq)]
enum Page {
    /// The file only points at another slug.
    Redirect(String),

    /// A real article.
    Body { title: Option<String>, links: Vec<String> },
}

impl ContentLibrary {
    /// Index every `.md` file under `root`.
    ///
    /// Respects `.gitignore`. When two files normalize to the same slug,
    /// the first in path order wins.
    pub fn open(root: &Path, max_redirects: usize) -> Result<Self, LinkError> {
        if !root.is_dir() {
            return Err(LinkError::Unavailable(format!(
                "content directory not found: {}",
                root.display()
            )));
        }

        let mut files = BTreeMap::new();
        let mut slugs = BTreeMap::new();
        for entry in WalkBuilder::new(root)
            .hidden(false)
            .sort_by_file_name(Ord::cmp)
            .build()
        {
            let entry = entry.map_err(|e| LinkError::Unavailable(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_some_and(|ft| ft.is_file())
                || path.extension().and_then(|e| e.to_str()) != Some("md")
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let slug = normalize_slug(stem);
            if files.contains_key(&slug) {
                warn!(%slug, path = %path.display(), "duplicate article slug, ignoring");
                continue;
            }
            slugs.insert(ArticleId::for_slug(&slug), slug.clone());
            files.insert(slug, path.to_path_buf());
        }
        debug!(articles = files.len(), root = %root.display(), "indexed content");

        Ok(Self {
            files,
            slugs,
            max_redirects,
        })
    }

    /// Look up an article's slug and title by identity.
    pub fn article(&self, id: ArticleId) -> Result<Article, LinkError> {
        let slug = self.slugs.get(&id).ok_or(LinkError::ArticleNotFound(id))?;
        let title = match self.read_page(slug)? {
            Page::Body { title, .. } => title,
            Page::Redirect(_) => None,
        };
        Ok(Article {
            id,
            slug: slug.clone(),
            title: title.unwrap_or_else(|| slug.clone()),
        })
    }

    /// Read and parse the file behind `slug`.
    fn read_page(&self, slug: &str) -> Result<Page, LinkError> {
        let path = self
            .files
            .get(slug)
            .ok_or_else(|| LinkError::SlugNotFound(slug.to_string()))?;
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LinkError::SlugNotFound(slug.to_string()));
            }
            Err(e) => {
                return Err(LinkError::Unavailable(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(parse_page(&text))
    }
}

impl LinkGraph for ContentLibrary {
    /// Follows redirects. A chain longer than `max_redirects`, or one that
    /// loops, resolves to nothing.
    fn resolve_slug(&self, slug: &str) -> Result<ArticleId, LinkError> {
        let mut current = normalize_slug(slug);
        let mut seen = BTreeSet::new();
        loop {
            if !seen.insert(current.clone()) || seen.len() > self.max_redirects + 1 {
                warn!(slug, "redirect chain too long or cyclic");
                return Err(LinkError::SlugNotFound(slug.to_string()));
            }
            match self.read_page(&current)? {
                Page::Body { .. } => return Ok(ArticleId::for_slug(&current)),
                Page::Redirect(target) => current = normalize_slug(&target),
            }
        }
    }

    fn outbound_links(&self, article: ArticleId) -> Result<BTreeSet<ArticleId>, LinkError> {
        let slug = self
            .slugs
            .get(&article)
            .ok_or(LinkError::ArticleNotFound(article))?;
        // A redirect is a name for another article, not an article itself.
        let Page::Body { links, .. } = self.read_page(slug)? else {
            return Err(LinkError::ArticleNotFound(article));
        };

        let mut targets = BTreeSet::new();
        for link in links {
            match self.resolve_slug(&link) {
                Ok(id) => {
                    targets.insert(id);
                }
                Err(LinkError::SlugNotFound(_)) => debug!(from = %slug, to = %link, "dangling link"),
                Err(e) => return Err(e),
            }
        }
        Ok(targets)
    }
}

/// Parse an article file into a redirect or a title plus internal link slugs.
fn parse_page(text: &str) -> Page {
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty());
    if let Some(target) = first_line.and_then(|l| l.strip_prefix("redirect:")) {
        return Page::Redirect(target.trim().to_string());
    }

    let title = text
        .lines()
        .find_map(|l| l.trim().strip_prefix("# "))
        .map(|t| t.trim().to_string());

    let links = Parser::new(text)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => internal_slug(&dest_url),
            _ => None,
        })
        .collect();

    Page::Body { title, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tempfile::TempDir;

    use crate::game::{Game, GameError};
    use crate::storage::Storage;
    use crate::validate::Rules;

    fn write(dir: &Path, name: &str, text: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn sample_library() -> (TempDir, ContentLibrary) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "dog.md",
            "# Dog\n\nThe dog is an [animal](/wiki/animal) related to the [wolf](wolf).\n\
             See also [cats](./canine.md) and [elsewhere](https://example.com).\n",
        );
        write(dir.path(), "animal.md", "# Animal\n\nLiving things.\n");
        write(dir.path(), "nested/wolf.md", "# Wolf\n\nA wild [dog](/wiki/dog).\n");
        write(dir.path(), "canine.md", "redirect: Dog\n");
        write(dir.path(), "loop-a.md", "redirect: loop-b\n");
        write(dir.path(), "loop-b.md", "redirect: loop-a\n");
        write(dir.path(), "notes.txt", "not an article");
        let library = ContentLibrary::open(dir.path(), 8).unwrap();
        (dir, library)
    }

    #[test]
    fn resolves_slugs_case_insensitively() {
        let (_dir, library) = sample_library();

        assert_eq!(library.resolve_slug("Dog").unwrap(), ArticleId::for_slug("dog"));
        assert_eq!(library.resolve_slug("wolf").unwrap(), ArticleId::for_slug("wolf"));
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let (_dir, library) = sample_library();

        let err = library.resolve_slug("notes").unwrap_err();
        assert!(matches!(err, LinkError::SlugNotFound(_)));
    }

    #[test]
    fn redirect_resolves_to_canonical_article() {
        let (_dir, library) = sample_library();

        assert_eq!(library.resolve_slug("canine").unwrap(), ArticleId::for_slug("dog"));
    }

    #[test]
    fn redirect_cycle_is_not_found() {
        let (_dir, library) = sample_library();

        let err = library.resolve_slug("loop-a").unwrap_err();
        assert!(matches!(err, LinkError::SlugNotFound(_)));
    }

    #[test]
    fn redirect_chain_longer_than_limit_is_not_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "redirect: b\n");
        write(dir.path(), "b.md", "redirect: c\n");
        write(dir.path(), "c.md", "# C\n");

        let strict = ContentLibrary::open(dir.path(), 1).unwrap();
        assert!(strict.resolve_slug("a").is_err());

        let lenient = ContentLibrary::open(dir.path(), 2).unwrap();
        assert_eq!(lenient.resolve_slug("a").unwrap(), ArticleId::for_slug("c"));
    }

    #[test]
    fn outbound_links_are_canonical_and_internal_only() {
        let (_dir, library) = sample_library();

        let links = library.outbound_links(ArticleId::for_slug("dog")).unwrap();

        let expected: BTreeSet<_> = ["animal", "wolf", "dog"]
            .iter()
            .map(|s| ArticleId::for_slug(s))
            .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn outbound_links_skip_dangling_targets() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dog.md", "# Dog\n[gone](/wiki/gone) [cat](cat)\n");
        write(dir.path(), "cat.md", "# Cat\n");
        let library = ContentLibrary::open(dir.path(), 8).unwrap();

        let links = library.outbound_links(ArticleId::for_slug("dog")).unwrap();
        assert_eq!(links, BTreeSet::from([ArticleId::for_slug("cat")]));
    }

    #[test]
    fn outbound_links_follow_live_edits() {
        let (dir, library) = sample_library();
        let animal = ArticleId::for_slug("animal");
        assert!(library.outbound_links(animal).unwrap().is_empty());

        write(dir.path(), "animal.md", "# Animal\n\nFor example the [dog](dog).\n");

        let links = library.outbound_links(animal).unwrap();
        assert!(links.contains(&ArticleId::for_slug("dog")));
    }

    #[test]
    fn redirect_page_is_not_an_article() {
        let (_dir, library) = sample_library();

        let err = library.outbound_links(ArticleId::for_slug("canine")).unwrap_err();
        assert!(matches!(err, LinkError::ArticleNotFound(_)));
    }

    #[test]
    fn game_cannot_start_or_end_on_a_redirect() {
        let (dir, library) = sample_library();
        let storage = Storage::new(dir.path().join(".data"), Duration::from_secs(5)).unwrap();
        let game = Game::new(&storage, &library, Rules::default());
        let dog = ArticleId::for_slug("dog");
        let canine = ArticleId::for_slug("canine");

        let as_start = game.create_game("alice", canine, ArticleId::for_slug("animal"));
        let as_end = game.create_game("alice", ArticleId::for_slug("wolf"), canine);

        assert!(matches!(as_start, Err(GameError::NotFound(_))));
        assert!(matches!(as_end, Err(GameError::NotFound(_))));
        assert!(game.create_game("alice", ArticleId::for_slug("wolf"), dog).is_ok());
    }

    #[test]
    fn percent_encoded_links_resolve() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "den.md", "# Den
[fox](/wiki/Red%20Fox)
");
        write(dir.path(), "red-fox.md", "# Red fox
");
        let library = ContentLibrary::open(dir.path(), 8).unwrap();

        let links = library.outbound_links(ArticleId::for_slug("den")).unwrap();
        assert_eq!(links, BTreeSet::from([ArticleId::for_slug("red-fox")]));
    }

    #[test]
    fn article_reports_title() {
        let (_dir, library) = sample_library();

        let article = library.article(ArticleId::for_slug("wolf")).unwrap();
        assert_eq!(article.slug, "wolf");
        assert_eq!(article.title, "Wolf");
    }

    #[test]
    fn open_missing_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = ContentLibrary::open(&dir.path().join("missing"), 8).err().unwrap();
        assert!(matches!(err, LinkError::Unavailable(_)));
    }

    #[test]
    fn parses_redirect_page() {
        assert_eq!(
            parse_page("\n  redirect: Grey Wolf\n"),
            Page::Redirect("Grey Wolf".into())
        );
    }
}
