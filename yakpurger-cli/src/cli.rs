use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use yakpurger_engine::{DEFAULT_BATCH_SIZE, Network, PurgeMethod};

#[derive(Parser, Debug)]
#[command(
    name = "yakpurger",
    version,
    about = "Purge every file referenced by HLS manifests from the CDN cache",
    group(ArgGroup::new("input").required(true).args(["url", "file"]))
)]
pub struct Args {
    /// Root manifest URL to crawl
    #[arg(short = 'u', long = "url", value_name = "URI")]
    pub url: Option<String>,

    /// File with one root manifest URL per line
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Objects per purge request
    #[arg(long = "batchSize", default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_batch_size)]
    pub batch_size: usize,

    #[arg(long = "network", value_enum, default_value_t = Network::Production)]
    pub network: Network,

    #[arg(long = "purgeMethod", value_enum, default_value_t = PurgeMethod::Delete)]
    pub purge_method: PurgeMethod,

    /// Leave .ts/.mp4/.mp4a/.mp4v segments out of the purge list
    #[arg(long = "excludeSegments")]
    pub exclude_segments: bool,

    /// String prepended to every root URL
    #[arg(long = "prefix")]
    pub prefix: Option<String>,

    /// Append a line per purged object to this file
    #[arg(long = "logFile", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Resume at this batch index, skipping the ones before it
    #[arg(long = "skipToBatch", value_name = "INDEX")]
    pub skip_to_batch: Option<usize>,

    /// Enable debug logging
    #[arg(long = "debug")]
    pub debug: bool,

    /// EdgeGrid credentials file [default: ~/.edgerc]
    #[arg(short = 'e', long = "edgerc", value_name = "PATH")]
    pub edgerc: Option<PathBuf>,

    /// Section of the credentials file to use
    #[arg(short = 's', long = "section", default_value = "default")]
    pub section: String,

    /// Account switch key for multi-account API clients
    #[arg(short = 'a', long = "accountSwitchKey")]
    pub account_switch_key: Option<String>,

    /// Where to write the discovered file list
    #[arg(short = 'o', long = "output", default_value = "output.txt")]
    pub output: PathBuf,

    /// Discover and write the file list without purging
    #[arg(long = "dryRun")]
    pub dry_run: bool,

    /// Extra request header for manifest fetches, as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
