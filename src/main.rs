mod cli;
mod config;
mod content;
mod game;
mod identity;
mod links;
mod model;
mod navigate;
mod results;
mod storage;
mod validate;

use std::{io, process};

use tracing_subscriber::EnvFilter;

use config::Config;

fn main() {
    let filter = EnvFilter::try_from_env("LINKRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
