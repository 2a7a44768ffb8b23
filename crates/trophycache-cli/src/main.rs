//! trophycache - load an achievement showcase repository from the terminal.
//!
//! Prints a per-game summary (or the full collection as JSON) for a
//! GitHub-hosted achievement showcase, reusing the local cache whenever the
//! remote data has not changed and falling back to it when offline.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trophycache_core::sync::{DataOrigin, LoadOutcome};
use trophycache_core::utils::{format_unlock_date, truncate_string};
use trophycache_core::{load_games, CacheManager, Config, GithubClient, RemoteConfig};

// ============================================================================
// Constants
// ============================================================================

/// Width of the game name column in the summary table
const NAME_COLUMN_WIDTH: usize = 40;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Load an achievement showcase repository
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "trophycache", version)]
struct Args {
    /// GitHub Pages address of the showcase, e.g. https://octocat.github.io/trophies/
    pages_url: Option<String>,

    /// Repository owner (use with --repo instead of a Pages address)
    #[arg(long)]
    owner: Option<String>,

    /// Repository name
    #[arg(long)]
    repo: Option<String>,

    /// Print the whole collection as JSON
    #[arg(long)]
    json: bool,

    /// Print the repository's custom gamercard HTML and exit
    #[arg(long)]
    gamercard: bool,

    /// Delete the cached game data and exit
    #[arg(long)]
    clear_cache: bool,

    /// Remember the repository settings for later runs
    #[arg(long)]
    save: bool,
}

impl Args {
    /// Layer environment and command-line overrides onto the saved config.
    fn apply(&self, config: &mut Config) {
        if let Ok(url) = std::env::var("TROPHYCACHE_PAGES_URL") {
            config.pages_url = Some(url);
        }
        if let Ok(owner) = std::env::var("TROPHYCACHE_OWNER") {
            config.owner = Some(owner);
        }
        if let Ok(repo) = std::env::var("TROPHYCACHE_REPO") {
            config.repo = Some(repo);
        }
        if let Some(ref url) = self.pages_url {
            config.pages_url = Some(url.clone());
        }
        if let Some(ref owner) = self.owner {
            config.owner = Some(owner.clone());
        }
        if let Some(ref repo) = self.repo {
            config.repo = Some(repo.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args = Args::parse();
    let mut config = Config::load().context("Failed to load config")?;
    args.apply(&mut config);
    if args.save {
        config.save().context("Failed to save config")?;
    }

    let identity = config.identity();
    if identity.is_placeholder() {
        bail!(
            "No repository configured. Pass a GitHub Pages URL, --owner/--repo, \
             or set TROPHYCACHE_PAGES_URL (see --help)."
        );
    }

    // Canonical casing matters for raw file URLs
    let client = GithubClient::new(RemoteConfig::new(identity))?;
    let identity = client.resolve_identity().await;
    let remote = RemoteConfig::new(identity.clone());
    let client = client.with_remote(remote.clone());
    info!(owner = %identity.owner, repo = %identity.repo, "trophycache starting");

    let cache_dir = config.cache_dir(&identity)?;
    debug!(?cache_dir, "Cache directory configured");
    let mut cache = CacheManager::open(&cache_dir)?;

    if args.clear_cache {
        cache.clear()?;
        eprintln!("Cleared cached game data for {}/{}", identity.owner, identity.repo);
        return Ok(());
    }

    if args.gamercard {
        match client.fetch_gamercard().await {
            Some(html) => println!("{}", html),
            None => eprintln!("No custom gamercard found"),
        }
        return Ok(());
    }

    let mut progress = |current: usize, total: usize| {
        eprint!("\rLoading game {} of {}...", current, total);
        let _ = io::stderr().flush();
    };

    let outcome = match load_games(&remote, &client, &mut cache, &mut progress).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!();
            eprintln!("Could not load games: {}", e);
            eprintln!();
            eprintln!("{}", e.guidance());
            std::process::exit(1);
        }
    };
    eprintln!();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.collection)?);
    } else {
        print_summary(&identity.owner, &outcome);
    }

    Ok(())
}

fn print_summary(owner: &str, outcome: &LoadOutcome) {
    let games = &outcome.collection;

    println!(
        "{} - {} games, {}/{} achievements",
        owner,
        games.len(),
        games.total_unlocked(),
        games.total_achievements()
    );
    println!();

    for game in games.iter() {
        let last = game
            .last_unlocked_at()
            .map(format_unlock_date)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<width$}  {:>4}/{:<4} {:>3}%  {}",
            truncate_string(&game.name, NAME_COLUMN_WIDTH),
            game.unlocked_count(),
            game.total_count(),
            game.completion_percent(),
            last,
            width = NAME_COLUMN_WIDTH
        );
    }

    println!();
    println!("Source: {}", outcome.origin.describe());
    if let DataOrigin::Manifest(freshness) = &outcome.origin {
        if freshness.is_degraded() {
            println!("Warning: showing cached data, the remote could not be reached");
        }
    }
    for skipped in &outcome.skipped {
        println!("Skipped {}: {}", skipped.id, skipped.error);
    }
}

// ============================================================================
// Tests
// ============================================================================
