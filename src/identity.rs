//! Player identity resolution.
//!
//! Every game belongs to a player, and a player may hold one active game.
//! Rather than requiring `--as` on every invocation, identity is resolved
//! through a chain:
//!
//! 1. `--as <player>`: explicit per-command override
//! 2. `LINKRACE_PLAYER` env var: process/session level
//! 3. `player` in `~/.linkrace/config.toml`: global default

use std::env;

use crate::config::Config;

/// Error message shown when identity cannot be resolved.
pub const PLAYER_REQUIRED: &str = "player required: pass --as <player>, \
    set LINKRACE_PLAYER, or add `player = \"...\"` to ~/.linkrace/config.toml";

/// Resolve the acting player from the tiered resolution chain.
///
/// Empty values at any tier are skipped.
pub fn resolve_player(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    let from_env = env::var("LINKRACE_PLAYER").ok();
    choose_player(explicit, from_env.as_deref(), config)
}

/// The first non-blank player among the explicit flag, the environment
/// value, and the config file, in that order.
fn choose_player(
    explicit: Option<&str>,
    from_env: Option<&str>,
    config: &Config,
) -> Result<String, String> {
    [explicit, from_env, config.player.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PLAYER_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(player: Option<&str>) -> Config {
        Config {
            player: player.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_wins() {
        let config = configured(Some("configured"));
        assert_eq!(
            choose_player(Some("alice"), Some("from-env"), &config).unwrap(),
            "alice"
        );
    }

    #[test]
    fn env_used_without_explicit() {
        let config = configured(Some("configured"));
        assert_eq!(choose_player(None, Some("bob"), &config).unwrap(), "bob");
    }

    #[test]
    fn config_used_last() {
        let config = configured(Some("carol"));
        assert_eq!(choose_player(None, None, &config).unwrap(), "carol");
    }

    #[test]
    fn blank_tiers_are_skipped() {
        let config = configured(Some(" carol "));
        assert_eq!(
            choose_player(Some("  "), Some(""), &config).unwrap(),
            "carol"
        );
        assert_eq!(
            choose_player(Some(""), Some(" bob "), &config).unwrap(),
            "bob"
        );
    }

    #[test]
    fn no_player_anywhere_is_an_error() {
        let err = choose_player(None, Some("  "), &configured(None)).unwrap_err();
        assert_eq!(err, PLAYER_REQUIRED);
    }

    #[test]
    fn explicit_flag_beats_whatever_the_environment_holds() {
        let config = configured(None);
        assert_eq!(resolve_player(Some(" dave "), &config).unwrap(), "dave");
    }
}
