//! Wayback-Archive main entry point
//!
//! This is the command-line interface for rebuilding archived websites.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wayback_archive::config::{collect_settings, compute_config_hash, describe_config, Config};
use wayback_archive::crawler::Coordinator;
use wayback_archive::output::print_statistics;

/// Wayback-Archive: offline copies of archived websites
///
/// Crawls a Wayback Machine snapshot starting from WAYBACK_URL, recovers
/// missing assets from nearby snapshots and a CDN mirror, and writes a
/// browsable directory tree. All settings can also be given as environment
/// variables, in a `.env` file or in a TOML file.
#[derive(Parser, Debug)]
#[command(name = "wayback-archive")]
#[command(version = "1.0.0")]
#[command(about = "Offline copies of archived websites", long_about = None)]
struct Cli {
    /// Snapshot URL (overrides WAYBACK_URL)
    #[arg(value_name = "WAYBACK_URL")]
    wayback_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Output directory (overrides OUTPUT_DIR)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum number of resources to fetch (overrides MAX_FILES)
    #[arg(long, value_name = "N")]
    max_files: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show the entry point without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load(&cli)?;
    let fingerprint = compute_config_hash(&config);
    tracing::info!("Configuration loaded successfully (fingerprint: {})", fingerprint);

    if cli.dry_run {
        handle_dry_run(&config, &fingerprint);
        return Ok(());
    }

    handle_reconstruction(config).await
}

/// Merges file, `.env`, environment and command-line settings
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut settings = collect_settings(cli.config.as_deref(), cli.env_file.as_deref())
        .context("Failed to load configuration")?;

    if let Some(url) = &cli.wayback_url {
        settings.set("WAYBACK_URL", url.as_str());
    }
    if let Some(dir) = &cli.output_dir {
        settings.set("OUTPUT_DIR", dir.to_string_lossy().to_string());
    }
    if let Some(max) = cli.max_files {
        settings.set("MAX_FILES", max.to_string());
    }

    settings.resolve().context("Invalid configuration")
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wayback_archive=info,warn"),
            1 => EnvFilter::new("wayback_archive=debug,info"),
            2 => EnvFilter::new("wayback_archive=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, fingerprint: &str) {
    println!("=== Wayback-Archive Dry Run ===\n");

    println!("Archive:");
    println!("  Mirror: {}", config.archive.base);
    println!("  Snapshot: {}", config.archive.timestamp);
    println!("  Entry point: {}", config.archive.root);
    println!();

    println!("Settings:");
    for (key, value) in describe_config(config) {
        println!("  {}={}", key, value);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Fingerprint: {}", fingerprint);
}

/// Handles the main crawl, rewrite and write cycle
async fn handle_reconstruction(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Reconstructing {} at {} into {}",
        config.archive.root,
        config.archive.timestamp,
        config.output_dir.display()
    );

    let coordinator = Coordinator::new(config)?;

    // Ctrl-C stops the crawl; resources fetched so far are still written
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with what has been fetched");
            cancel.cancel();
        }
    });

    let summary = coordinator.run().await?;
    print_statistics(&summary);

    if summary.cancelled {
        tracing::info!("Run cancelled; partial output written");
    } else {
        tracing::info!("Reconstruction completed successfully");
    }

    Ok(())
}
