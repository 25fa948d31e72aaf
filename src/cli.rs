//! Command-line interface definitions.
//!
//! The only required argument is the output path. Everything else about a run
//! (site, cache location, freshness, concurrency, failure handling) comes from
//! the optional YAML config file.

use clap::Parser;
use std::path::PathBuf;

/// Collect the Montreal Gazette's trending stories into a JSON file.
///
/// # Examples
///
/// ```sh
/// # Write the trending stories to trending.json, caching pages in the current directory
/// gazette_trending -o trending.json
///
/// # With a config file
/// gazette_trending -o out/trending.json -c gazette.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output file in JSON format
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "GAZETTE_TRENDING_CONFIG")]
    pub config: Option<PathBuf>,
}
