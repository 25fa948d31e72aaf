//! # Gazette Trending
//!
//! A one-shot collector for the Montreal Gazette's "Trending" stories. It
//! reads the trending list from the news homepage, follows each story, pulls
//! the title, publication date, author and subtitle out of the article
//! header, and writes them as a JSON array.
//!
//! ## Usage
//!
//! ```sh
//! gazette_trending -o trending.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: pages are downloaded with a browser `User-Agent`
//! 2. **Caching**: each page is stored as `homepage.html` or `<slug>.html` and
//!    reused on later runs
//! 3. **Extraction**: fixed structural walks over the parsed markup
//! 4. **Output**: a single JSON write once every article has been collected

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod collector;
mod config;
mod error;
mod fetcher;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cache::FileStore;
use cli::Cli;
use collector::Collector;
use config::CollectorConfig;
use fetcher::HttpFetcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("gazette_trending starting up");

    let args = Cli::parse();
    debug!(?args.output, ?args.config, "Parsed CLI arguments");

    let config = CollectorConfig::load(args.config.as_deref())?;
    info!(
        base_url = %config.base_url,
        cache_dir = %config.cache_dir.display(),
        concurrency = config.concurrency,
        failure_policy = ?config.failure_policy,
        "Configuration ready"
    );

    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let store = FileStore::new(&config.cache_dir);
    let collector = Collector::new(fetcher, store, &config)?;

    match collector.run(&args.output).await {
        Ok(count) => {
            let elapsed = start_time.elapsed();
            info!(
                count,
                path = %args.output.display(),
                cache_dir = %collector.cache().store().dir().display(),
                ?elapsed,
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Collection failed");
            Err(e.into())
        }
    }
}
