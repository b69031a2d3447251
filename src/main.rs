//! Dex-Harvest main entry point
//!
//! This is the command-line interface for the Dex-Harvest species scraper.

use clap::Parser;
use dex_harvest::config::{load_config_with_hash, Config};
use dex_harvest::harvest::{run_harvest, HarvestReport};
use dex_harvest::output::{
    generate_markdown_summary, print_statistics, write_json, HarvestStatistics,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dex-Harvest: a concurrent species-page scraper
///
/// Dex-Harvest reads the catalog index of a reference site, fetches every
/// species page it links with a bounded worker pool, and extracts one
/// record per page. Pages that cannot be fetched or parsed are reported,
/// never silently dropped.
#[derive(Parser, Debug)]
#[command(name = "dex-harvest")]
#[command(version = "0.1.0")]
#[command(about = "A concurrent species-page scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with_all = ["json", "summary"])]
    dry_run: bool,

    /// Write the harvest as JSON to this path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write a markdown summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let report = handle_harvest(config).await?;

    if !cli.quiet {
        print_statistics(&HarvestStatistics::from_report(&report));
    }

    if let Some(path) = &cli.json {
        write_json(&report, path)?;
        tracing::info!("Harvest written to: {}", path.display());
    }

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&report, path)?;
        tracing::info!("Summary written to: {}", path.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dex_harvest=info,warn"),
            1 => EnvFilter::new("dex_harvest=debug,info"),
            2 => EnvFilter::new("dex_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Dex-Harvest Dry Run ===\n");

    let scraper = &config.scraper;
    println!("Scraper Configuration:");
    println!("  Concurrency: {}", scraper.concurrency);
    println!("  Request timeout: {}ms", scraper.request_timeout_ms);
    println!("  Retry limit: {}", scraper.retry_limit);
    println!(
        "  Backoff: {}ms doubling up to {}ms",
        scraper.backoff_base_ms, scraper.backoff_max_ms
    );
    println!("  Request delay: {}ms", scraper.request_delay_ms);
    match scraper.overall_deadline_ms {
        Some(ms) => println!("  Overall deadline: {}ms", ms),
        None => println!("  Overall deadline: none"),
    }
    println!("  Max redirects: {}", scraper.max_redirects);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nSelectors:");
    let selectors = &config.selectors;
    println!("  Index row: {}", selectors.index_row);
    println!("  Index link: {}", selectors.index_link);
    println!("  Catalog id: {}", selectors.catalog_id);
    println!("  Name: {} {}", selectors.content_region, selectors.heading);
    println!("  Categories: {}", selectors.category_tag);
    println!(
        "  Metrics: {} {}",
        selectors.metrics_table, selectors.metrics_cell
    );
    println!("  Generation: {}", selectors.generation);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start harvesting from {}", config.index_url()?);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> Result<HarvestReport, Box<dyn std::error::Error>> {
    tracing::info!(
        "Worker pool: {} workers, retry limit {}",
        config.scraper.concurrency,
        config.scraper.retry_limit
    );

    match run_harvest(config).await {
        Ok(report) => {
            if report.harvest.is_complete() {
                tracing::info!("Harvest completed without failures");
            } else {
                tracing::warn!(
                    "Harvest completed with {} failed pages",
                    report.harvest.failures.len()
                );
            }
            Ok(report)
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
