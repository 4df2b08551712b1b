//! loopcrawl main entry point
//!
//! This is the command-line interface for the loopcrawl web crawler.

use anyhow::Context;
use clap::Parser;
use loopcrawl::config::{load_config_or_default, validate_seed_url, Config};
use loopcrawl::crawler::crawl;
use loopcrawl::output::{load_statistics, print_statistics};
use loopcrawl::storage::CheckpointStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// loopcrawl: a resumable breadth-first web crawler
///
/// Crawls outward from a seed page, storing every fetched page and logging its
/// text and links. Send SIGINT or SIGTERM to stop; the frontier is saved and the
/// next run resumes from it.
#[derive(Parser, Debug)]
#[command(name = "loopcrawl")]
#[command(version)]
#[command(about = "A resumable breadth-first web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL, used when there is no checkpoint to resume
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl from the seed, ignoring any checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show where the crawl would start without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the checkpoint and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match load_config_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(seed) = cli.seed {
        validate_seed_url(&seed)?;
        config.crawler.seed_url = seed;
    }

    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("loopcrawl=info,warn"),
            1 => EnvFilter::new("loopcrawl=debug,info"),
            2 => EnvFilter::new("loopcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration and start point
fn handle_dry_run(config: &Config, fresh: bool) -> anyhow::Result<()> {
    println!("=== loopcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!(
        "  Request channel capacity: {}",
        config.crawler.request_channel_capacity
    );
    println!("  Fetch workers: {}", config.crawler.fetch_workers);
    println!("  Parse workers: {}", config.crawler.parse_workers);
    match config.crawler.request_timeout_secs {
        0 => println!("  Request timeout: none"),
        secs => println!("  Request timeout: {}s", secs),
    }
    println!(
        "  Malformed documents: {}",
        if config.crawler.halt_on_malformed_document {
            "halt the crawl"
        } else {
            "skip the page"
        }
    );

    println!("\nOutput:");
    println!("  Content directory: {}", config.output.content_dir);
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  History log: {}", config.output.history_path);

    println!("\n✓ Configuration is valid");

    let checkpoints = CheckpointStore::new(&config.output.checkpoint_path);
    match load_statistics(&checkpoints)? {
        Some(stats) if !fresh => println!(
            "✓ Would resume from checkpoint ({} waiting, {} seen)",
            stats.waiting, stats.seen
        ),
        _ => println!("✓ Would start from seed {}", config.crawler.seed_url),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Checkpoint: {}\n", config.output.checkpoint_path);

    let checkpoints = CheckpointStore::new(&config.output.checkpoint_path);
    match load_statistics(&checkpoints)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No checkpoint found"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous checkpoint)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if one exists)");
    }

    match crawl(config, fresh).await {
        Ok(state) => {
            tracing::info!(
                "States successfully saved ({} waiting, {} seen), exiting",
                state.waiting_len(),
                state.seen_len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("crawl stopped on a fatal error")
        }
    }
}
