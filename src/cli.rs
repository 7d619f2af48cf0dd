//! CLI interface for linkrace.
//!
//! Each subcommand is non-interactive: arguments in, text out. Identifiers go
//! to stdout; progress and hints go to stderr.
//!
//! Commands that mutate a game print the state they leave behind, so the
//! caller never has to guess: after any change, `status` is the refresh.
//!
//! `--game` and `results` take a full UUID or an unambiguous prefix.

mod format;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::Config;
use crate::content::ContentLibrary;
use crate::game::{Game, GameError};
use crate::identity::resolve_player;
use crate::links::{LinkError, LinkGraph};
use crate::model::GameSession;
use crate::navigate::{
    Click, NavigationIntent, Route, intercept, intercept_in_game, route_after_move,
};
use crate::results::GameResult;
use crate::storage::Storage;

use format::{format_article_view, format_history_line, format_result, format_session};

/// linkrace: get from one article to another using only the links in between.
#[derive(Debug, Parser)]
#[command(name = "linkrace", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Player to act as. Overrides `LINKRACE_PLAYER` and the config file.
    #[arg(long = "as", global = true)]
    player: Option<String>,

    /// Directory of Markdown articles. Overrides `content-dir` in the config file.
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow: a game from dog to animal
  1. linkrace --as alice new dog animal
     → prints a game ID (e.g. a3b0fc12) and the links on the dog article
  2. linkrace --as alice go /wiki/wolf
  3. linkrace --as alice go mammal
  4. linkrace --as alice go animal
     → game completed, results printed

Giving up:
  linkrace --as alice forfeit
  linkrace --as alice results a3b";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new game. Prints the game ID.
    ///
    /// Fails if the player already has an active game.
    New {
        /// Slug of the article to start on.
        start: String,
        /// Slug of the article to reach.
        end: String,
    },

    /// Show the active game and the links available from the current article.
    Status,

    /// Follow a link from the current article.
    ///
    /// Accepts a link as it appears in the article (`/wiki/wolf`, `wolf.md`)
    /// or a bare slug. Links that are not game moves are echoed back for
    /// ordinary navigation.
    Go {
        /// Link target or slug.
        target: String,

        /// Game to move in. Defaults to the active game.
        #[arg(long)]
        game: Option<String>,
    },

    /// Give up on a game. Forfeiting a finished game changes nothing.
    Forfeit {
        /// Game to forfeit. Defaults to the active game.
        #[arg(long)]
        game: Option<String>,
    },

    /// Show the results of a finished game.
    Results {
        /// Game ID: full UUID or unambiguous prefix.
        game: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the player's games, newest first.
    History,

    /// List the links out of an article.
    Links {
        /// Article slug. Defaults to the active game's current article.
        slug: Option<String>,
    },
}

/// Everything a command needs, resolved once.
struct Context<'a> {
    player: String,
    library: &'a ContentLibrary,
    game: Game<'a, ContentLibrary>,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    let player = resolve_player(cli.player.as_deref(), config)?;
    let root = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => Storage::default_root().ok_or("could not determine home directory")?,
    };
    let storage = Storage::new(root, config.busy_timeout())
        .map_err(|e| format!("failed to initialize storage: {e}"))?;
    let content_dir = cli
        .content
        .clone()
        .or_else(|| config.content_dir.clone())
        .ok_or("no content directory: pass --content <dir> or set content-dir in the config")?;
    let library = ContentLibrary::open(&content_dir, config.max_redirects)
        .map_err(|e| format!("failed to open content: {e}"))?;

    let ctx = Context {
        player,
        library: &library,
        game: Game::new(&storage, &library, config.rules()),
    };

    match cli.command {
        Command::New { start, end } => cmd_new(&ctx, &start, &end),
        Command::Status => cmd_status(&ctx),
        Command::Go { target, game } => cmd_go(&ctx, &target, game.as_deref()),
        Command::Forfeit { game } => cmd_forfeit(&ctx, game.as_deref()),
        Command::Results { game, json } => cmd_results(&ctx, &game, json),
        Command::History => cmd_history(&ctx),
        Command::Links { slug } => cmd_links(&ctx, slug.as_deref()),
    }
}

fn cmd_new(ctx: &Context<'_>, start: &str, end: &str) -> Result<(), String> {
    let start = ctx.library.resolve_slug(start).map_err(describe_link_error)?;
    let end = ctx.library.resolve_slug(end).map_err(describe_link_error)?;

    let session = ctx
        .game
        .create_game(&ctx.player, start, end)
        .map_err(|e| format!("failed to start game: {e}"))?;

    println!("{}", session.id);
    eprintln!("{}", format_session(&session, ctx.library));
    eprintln!("{}", article_view(ctx, &session)?);
    Ok(())
}

fn cmd_status(ctx: &Context<'_>) -> Result<(), String> {
    let Some(session) = active_game(ctx)? else {
        println!("No active game");
        return Ok(());
    };

    println!("{}", format_session(&session, ctx.library));
    println!("{}", article_view(ctx, &session)?);
    Ok(())
}

fn cmd_go(ctx: &Context<'_>, target: &str, game_ref: Option<&str>) -> Result<(), String> {
    let click = Click::in_content(target);
    let intent = match game_ref {
        Some(reference) => intercept_in_game(&click, &resolve_game(ctx, reference)?, ctx.library),
        None => intercept(&click, active_game(ctx)?.as_ref(), ctx.library),
    };
    let (session_id, next) = match intent {
        NavigationIntent::Move { session_id, next } => (session_id, next),
        NavigationIntent::PassThrough { href } => {
            eprintln!("Not a game move; open {href} as usual");
            return Ok(());
        }
    };

    let result = ctx.game.make_move_retrying(session_id, next);
    match route_after_move(&result) {
        Route::Results { session_id } => {
            let session = ctx.game.session(session_id).map_err(|e| e.to_string())?;
            let result = GameResult::from_session(&session).map_err(|e| e.to_string())?;
            eprintln!("You made it!");
            println!("{}", format_result(&result, &session, ctx.library));
            Ok(())
        }
        Route::Article { id } => {
            let session = result.map_err(|e| e.to_string())?;
            let links = ctx.library.outbound_links(id).map_err(describe_link_error)?;
            println!("{}", format_session(&session, ctx.library));
            println!("{}", format_article_view(id, &links, ctx.library));
            Ok(())
        }
        Route::Stay { message } => Err(message),
    }
}

fn cmd_forfeit(ctx: &Context<'_>, game_ref: Option<&str>) -> Result<(), String> {
    let session = match game_ref {
        Some(reference) => resolve_game(ctx, reference)?,
        None => active_game(ctx)?.ok_or("no active game to forfeit")?,
    };

    let session = ctx
        .game
        .forfeit_game(session.id)
        .map_err(|e| format!("failed to forfeit: {e}"))?;

    eprintln!("Game {} is {}", short_id(session.id), session.status.label());
    println!("{}", format_session(&session, ctx.library));
    Ok(())
}

fn cmd_results(ctx: &Context<'_>, reference: &str, json: bool) -> Result<(), String> {
    let session = resolve_game(ctx, reference)?;
    let result = GameResult::from_session(&session).map_err(|e| e.to_string())?;

    if json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| format!("failed to serialize result: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", format_result(&result, &session, ctx.library));
    }
    Ok(())
}

fn cmd_history(ctx: &Context<'_>) -> Result<(), String> {
    let sessions = ctx
        .game
        .history(&ctx.player)
        .map_err(|e| format!("failed to list games: {e}"))?;

    if sessions.is_empty() {
        println!("No games");
        return Ok(());
    }
    for session in &sessions {
        println!("{}", format_history_line(session, ctx.library));
    }
    Ok(())
}

fn cmd_links(ctx: &Context<'_>, slug: Option<&str>) -> Result<(), String> {
    let article = match slug {
        Some(slug) => ctx.library.resolve_slug(slug).map_err(describe_link_error)?,
        None => {
            active_game(ctx)?
                .ok_or("no active game; name an article")?
                .current()
        }
    };

    let links = ctx
        .library
        .outbound_links(article)
        .map_err(describe_link_error)?;
    println!("{}", format_article_view(article, &links, ctx.library));
    Ok(())
}

/// The current article and where it leads.
fn article_view(ctx: &Context<'_>, session: &GameSession) -> Result<String, String> {
    let links = ctx
        .library
        .outbound_links(session.current())
        .map_err(describe_link_error)?;
    Ok(format_article_view(session.current(), &links, ctx.library))
}

fn active_game(ctx: &Context<'_>) -> Result<Option<GameSession>, String> {
    ctx.game
        .active_game(&ctx.player)
        .map_err(|e| format!("failed to load active game: {e}"))
}

fn describe_link_error(e: LinkError) -> String {
    GameError::from(e).to_string()
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Resolve a game reference (full UUID or unambiguous prefix) to a session.
///
/// Prefixes are matched against the player's own games.
fn resolve_game(ctx: &Context<'_>, reference: &str) -> Result<GameSession, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return match ctx.game.player_session(&ctx.player, id) {
            Err(GameError::NotFound(_)) => Err(format!("no game matching '{reference}'")),
            other => other.map_err(|e| e.to_string()),
        };
    }

    // Try as a prefix match against the player's games.
    let sessions = ctx
        .game
        .history(&ctx.player)
        .map_err(|e| format!("failed to list games: {e}"))?;

    let matches: Vec<&GameSession> = sessions
        .iter()
        .filter(|s| s.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no game matching '{reference}'")),
        1 => Ok(matches[0].clone()),
        n => {
            let ids: Vec<String> = matches.iter().map(|s| short_id(s.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous, matches {n} games: {}",
                ids.join(", ")
            ))
        }
    }
}
