//! Feedback-Crawler main entry point
//!
//! This is the command-line interface for the Feedback-Crawler company
//! feedback harvester.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use feedback_crawler::config::{load_config_with_hash, Config, EngineKind};
use feedback_crawler::crawler::{listing_url, page_url};
use feedback_crawler::output::{load_company_statistics, print_company_statistics, CrawlResponse};
use feedback_crawler::storage::SqliteStorage;
use feedback_crawler::CrawlService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Feedback-Crawler: company feedback harvester
///
/// Feedback-Crawler walks every listing page of one company on a review
/// site, extracts its comments and reviews, and upserts them into a SQLite
/// database. The result is printed as a JSON envelope on stdout.
#[derive(Parser, Debug)]
#[command(name = "feedback-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Harvests company comments and reviews", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Company slug, as it appears in the listing URL
    #[arg(value_name = "SLUG")]
    slug: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the browser engine from the configuration
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show stored statistics for the company and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Chromium,
    Http,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Chromium => EngineKind::Chromium,
            EngineArg::Http => EngineKind::Http,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(engine) = cli.engine {
        config.browser.engine = engine.into();
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.slug);
    } else if cli.stats {
        handle_stats(&config, &cli.slug)?;
    } else if !handle_crawl(config, config_hash, &cli.slug).await? {
        std::process::exit(1);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the command's output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feedback_crawler=info,warn"),
            1 => EnvFilter::new("feedback_crawler=debug,info"),
            2 => EnvFilter::new("feedback_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, slug: &str) {
    println!("=== Feedback-Crawler Dry Run ===\n");

    println!("Site:");
    println!("  Root URL: {}", config.site.root_url);
    println!("  Listing root: {}", listing_url(&config.site.root_url, slug));
    println!("  First page: {}", page_url(&config.site.root_url, slug, 1));

    println!("\nBrowser:");
    println!("  Engine: {}", config.browser.engine.as_str());
    println!("  Idle time: {}ms", config.browser.idle_time_ms);
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout_ms
    );
    if let Some(agent) = &config.browser.user_agent {
        println!("  User agent: {}", agent);
    }

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nService:");
    println!(
        "  Max concurrent crawls: {}",
        config.service.max_concurrent_crawls
    );
    println!("  Admission: {:?}", config.service.admission);
    println!("  Per-slug lock: {}", config.service.per_slug_lock);

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl company '{}'", slug);
}

/// Handles the --stats mode: shows stored statistics for one company
fn handle_stats(config: &Config, slug: &str) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::open(&config.storage)
        .with_context(|| format!("Failed to open {}", config.storage.database_path))?;

    let stats = load_company_statistics(&storage, slug)?;
    print_company_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// Prints the response envelope and returns whether the crawl succeeded.
async fn handle_crawl(config: Config, config_hash: String, slug: &str) -> anyhow::Result<bool> {
    tracing::info!(
        "Crawling '{}' from {} with the {} engine",
        slug,
        config.site.root_url,
        config.browser.engine.as_str()
    );

    let service = CrawlService::new(config, config_hash);

    let (response, succeeded) = match service.crawl(slug).await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            (CrawlResponse::success(summary), true)
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            (CrawlResponse::failure(&e), false)
        }
    };

    println!("{}", response.to_json()?);
    Ok(succeeded)
}
