//! cloudwatch-scrape: discover cloud resources and scrape their CloudWatch metrics
//!
//! Runs one scrape over every job in the configuration and writes the
//! discovered resources and scraped records as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use cloudwatch_scrape::Scraper;
use cloudwatch_scrape::aws::AwsClientFactory;
use cloudwatch_scrape_common::defaults::{
    DEFAULT_CLOUDWATCH_CONCURRENCY, DEFAULT_DISCOVERY_CONCURRENCY, DEFAULT_METRICS_PER_QUERY,
};
use cloudwatch_scrape_common::{ScrapeConfig, ScrapeSettings};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cloudwatch-scrape")]
#[command(about = "Discover resources and scrape their CloudWatch metrics")]
#[command(version)]
struct Args {
    /// Path to the YAML scrape configuration
    #[arg(short, long, env = "CLOUDWATCH_SCRAPE_CONFIG")]
    config: PathBuf,

    /// Maximum queries per GetMetricData call
    #[arg(long, default_value_t = DEFAULT_METRICS_PER_QUERY)]
    metrics_per_query: usize,

    /// Concurrent tag and metric catalog calls
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_CONCURRENCY)]
    discovery_concurrency: usize,

    /// Concurrent single-metric (static job) calls
    #[arg(long, default_value_t = DEFAULT_CLOUDWATCH_CONCURRENCY)]
    cloudwatch_concurrency: usize,

    /// Use the FIPS CloudWatch endpoint
    #[arg(long)]
    fips: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Output JSON file for results (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            metrics_per_query: self.metrics_per_query,
            discovery_concurrency: self.discovery_concurrency,
            cloudwatch_concurrency: self.cloudwatch_concurrency,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error and its cause chain to stderr, colored when stderr is a terminal
fn print_error(e: &anyhow::Error) {
    let mut stderr = std::io::stderr();
    let color = stderr.is_terminal();
    let _ = write_error(&mut stderr, e, color);

    // Backtrace hint only when the user hasn't asked for one
    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n{}",
            paint(color, "2", "Set RUST_BACKTRACE=1 for a detailed backtrace")
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n{}\n{backtrace}", paint(color, "2", "Backtrace:"));
        }
    }
}

/// Write the top-level message followed by one line per cause
fn write_error(out: &mut impl Write, e: &anyhow::Error, color: bool) -> std::io::Result<()> {
    writeln!(out, "\n{} {e}", paint(color, "1;31", "Error:"))?;

    // Causes, outermost first
    for cause in e.chain().skip(1) {
        writeln!(out, "  {} {cause}", paint(color, "33", "Caused by:"))?;
    }
    Ok(())
}

fn paint(color: bool, sgr: &str, text: &str) -> String {
    if color {
        format!("\x1b[{sgr}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Reduce noise from the AWS SDK (show only warnings and errors)
    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_sdk_autoscaling=warn".parse()?)
        .add_directive("aws_sdk_cloudwatch=warn".parse()?)
        .add_directive("aws_sdk_resourcegroupstagging=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug)?;

    let settings = args.settings();
    settings.validate()?;

    let config = ScrapeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        config = %args.config.display(),
        discovery_jobs = config.discovery.jobs.len(),
        static_jobs = config.static_jobs.len(),
        metrics_per_query = settings.metrics_per_query,
        fips = args.fips,
        "Starting scrape"
    );

    let factory = AwsClientFactory::new(args.fips).await;
    let scraper = Scraper::new(factory, config, settings)?;
    let result = scraper.scrape().await;

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize results")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write results to {}", path.display()))?;
            info!(path = %path.display(), "Results written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
