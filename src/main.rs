//! catalog-dl command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_dl::{Config, Harvester, IndicatifReporter};

/// Download every photo referenced by a paginated house catalog
#[derive(Debug, Parser)]
#[command(name = "catalog-dl", version, about)]
struct Args {
    /// The number of pages to download
    #[arg(long, alias = "pageCount", env = "CATALOG_DL_PAGE_COUNT")]
    page_count: Option<u32>,

    /// The directory to download the images to
    #[arg(long, alias = "downloadPath", env = "CATALOG_DL_DOWNLOAD_PATH")]
    download_path: Option<PathBuf>,

    /// Catalog listing endpoint
    #[arg(long, env = "CATALOG_DL_ENDPOINT")]
    endpoint: Option<String>,

    /// Records expected per page (sizes the progress bar)
    #[arg(long)]
    records_per_page: Option<u32>,

    /// JSON configuration file; flags override its values
    #[arg(long, env = "CATALOG_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Give up after this many retries (default: retry forever)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Multiply the retry delay by this factor after every retry
    #[arg(long)]
    backoff_multiplier: Option<f64>,

    /// Randomize retry delays
    #[arg(long)]
    jitter: bool,

    /// Only retry transient failures (timeouts, 5xx, 429)
    #[arg(long)]
    transient_only: bool,

    /// Save response bodies even when the server answers with an error status
    #[arg(long)]
    lax_status: bool,

    /// Also fail the HEAD probe on a non-success status
    #[arg(long)]
    strict_probe: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(pages) = self.page_count {
            config.catalog.page_count = pages;
        }
        if let Some(dir) = self.download_path {
            config.download.save_dir = dir;
        }
        if let Some(endpoint) = self.endpoint {
            config.catalog.endpoint = endpoint;
        }
        if let Some(per_page) = self.records_per_page {
            config.catalog.records_per_page = per_page;
        }
        if let Some(max) = self.max_retries {
            config.retry.max_retries = Some(max);
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            config.retry.backoff_multiplier = multiplier;
        }
        if self.jitter {
            config.retry.jitter = true;
        }
        if self.transient_only {
            config.retry.retry_all_errors = false;
        }
        if self.lax_status {
            config.download.strict_status = false;
        }
        if self.strict_probe {
            config.download.strict_probe_status = true;
        }
        if let Some(secs) = self.timeout_secs {
            config.download.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "catalog_dl=debug"
    } else {
        "catalog_dl=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.into_config()?;
    let expected =
        u64::from(config.catalog.page_count) * u64::from(config.catalog.records_per_page);

    let harvester = Harvester::new(config).context("invalid configuration")?;
    let summary = harvester
        .run_with_progress(Box::new(IndicatifReporter::new(expected)))
        .await?;

    if summary.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "{} asset(s) and {} page(s) could not be downloaded",
            summary.failed_assets, summary.failed_pages
        );
        Ok(ExitCode::FAILURE)
    }
}
