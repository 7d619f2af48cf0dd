//! linkrace configuration.
//!
//! Loaded from `~/.linkrace/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::validate::Rules;

/// linkrace configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Default player identity, used when `--as` and `LINKRACE_PLAYER` are absent.
    pub player: Option<String>,

    /// Directory of Markdown articles to play on.
    pub content_dir: Option<PathBuf>,

    /// Where sessions are stored. Defaults to `~/.linkrace/data/`.
    pub data_dir: Option<PathBuf>,

    /// Whether a path may step back onto an article it already visited.
    pub allow_revisits: bool,

    /// How many redirect hops a link may take to reach its article.
    pub max_redirects: usize,

    /// How long to wait for a locked database before giving up.
    pub busy_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: None,
            content_dir: None,
            data_dir: None,
            allow_revisits: true,
            max_redirects: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load config from `~/.linkrace/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.linkrace/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".linkrace").join("config.toml"))
    }

    pub fn rules(&self) -> Rules {
        Rules {
            allow_revisits: self.allow_revisits,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
