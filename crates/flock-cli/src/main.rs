#![forbid(unsafe_code)]

mod api;
mod cmd;
mod config;
mod db;
mod output;
mod tui;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::Config;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "flock: a terminal client for Mastodon-style timelines",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a config file (defaults to flock.toml lookup).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Browse the timeline interactively",
        long_about = "Open the full-screen timeline with incremental refresh, gap filling, and a thread view.",
        after_help = "EXAMPLES:\n    # Browse the configured server\n    flock tui\n\n    # Browse another server for this run\n    FLOCK_SERVER=https://example.social flock tui"
    )]
    Tui,

    #[command(
        about = "Fetch timeline pages into the local store",
        long_about = "Fetch the newest page (and optionally older ones) and persist them locally.",
        after_help = "EXAMPLES:\n    # Fetch the newest page\n    flock fetch\n\n    # Fetch five pages\n    flock fetch --pages 5\n\n    # Emit machine-readable output\n    flock fetch --json"
    )]
    Fetch(cmd::fetch::FetchArgs),

    #[command(
        about = "Print the stored timeline",
        long_about = "Print stored statuses, newest first, without touching the network.",
        after_help = "EXAMPLES:\n    # Print the newest 20 statuses\n    flock list\n\n    # Emit machine-readable output\n    flock list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Check the database and configuration",
        long_about = "Run an integrity check on the status database and report configuration.",
        after_help = "EXAMPLES:\n    # Check everything\n    flock doctor\n\n    # Emit machine-readable output\n    flock doctor --json"
    )]
    Doctor,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FLOCK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "flock=debug,info"
        } else {
            "flock=info,warn"
        })
    });

    let format = env::var("FLOCK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = Config::load(cli.config.as_deref())?;
    let mode = output::resolve_output_mode(cli.json);

    match cli.command {
        Commands::Tui => tui::timeline::run_timeline_tui(&config),
        Commands::Fetch(ref args) => cmd::fetch::run_fetch(args, mode, &config),
        Commands::List(ref args) => cmd::list::run_list(args, mode, &config),
        Commands::Doctor => cmd::doctor::run_doctor(mode, &config),
    }
}
