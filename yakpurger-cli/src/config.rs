use std::path::PathBuf;

use tracing::debug;
use yakpurger::error::AppError;
use yakpurger::utils::parse_headers;
use yakpurger_engine::{EdgeGridCredentials, FetchConfig, PurgeOptions};

use crate::cli::Args;

/// Where the root manifest URIs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootInput {
    Url(String),
    File(PathBuf),
}

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub input: RootInput,
    pub prefix: Option<String>,
    pub exclude_segments: bool,
    pub output: PathBuf,
    pub dry_run: bool,
    pub fetch: FetchConfig,
    pub purge: PurgeOptions,
    pub edgerc: Option<PathBuf>,
    pub section: String,
    pub account_switch_key: Option<String>,
}

impl ProgramConfig {
    pub fn from_args(args: Args) -> Result<Self, AppError> {
        let input = match (args.url, args.file) {
            (Some(url), None) => RootInput::Url(url),
            (None, Some(file)) => RootInput::File(file),
            _ => {
                return Err(AppError::InvalidInput(
                    "exactly one of --url or --file is required".to_string(),
                ));
            }
        };

        let mut fetch = FetchConfig::default();
        for (name, value) in parse_headers(&args.headers)? {
            fetch = fetch.with_header(&name, &value)?;
        }

        let purge = PurgeOptions {
            batch_size: args.batch_size,
            network: args.network,
            method: args.purge_method,
            resume_from_batch: args.skip_to_batch,
            log_file: args.log_file,
        };
        purge.validate()?;

        let config = Self {
            input,
            prefix: args.prefix.filter(|p| !p.is_empty()),
            exclude_segments: args.exclude_segments,
            output: args.output,
            dry_run: args.dry_run,
            fetch,
            purge,
            edgerc: args.edgerc.or_else(EdgeGridCredentials::default_path),
            section: args.section,
            account_switch_key: args.account_switch_key,
        };
        debug!(input = ?config.input, dry_run = config.dry_run, "Program configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use yakpurger_engine::{Network, PurgeMethod};

    fn config(argv: &[&str]) -> Result<ProgramConfig, AppError> {
        let mut full = vec!["yakpurger"];
        full.extend_from_slice(argv);
        ProgramConfig::from_args(Args::try_parse_from(full).unwrap())
    }

    #[test]
    fn url_input() {
        let config = config(&["-u", "https://cdn/master.m3u8"]).unwrap();
        assert_eq!(config.input, RootInput::Url("https://cdn/master.m3u8".into()));
        assert_eq!(config.purge.batch_size, 250);
        assert_eq!(config.purge.method, PurgeMethod::Delete);
        assert_eq!(config.purge.network, Network::Production);
    }

    #[test]
    fn purge_options_follow_flags() {
        let config = config(&[
            "-f",
            "roots.txt",
            "--batchSize",
            "10",
            "--skipToBatch",
            "2",
            "--purgeMethod",
            "invalidate",
            "--prefix",
            "https://cdn",
        ])
        .unwrap();
        assert_eq!(config.input, RootInput::File("roots.txt".into()));
        assert_eq!(config.purge.batch_size, 10);
        assert_eq!(config.purge.resume_from_batch, Some(2));
        assert_eq!(config.purge.method, PurgeMethod::Invalidate);
        assert_eq!(config.prefix.as_deref(), Some("https://cdn"));
    }

    #[test]
    fn headers_reach_fetch_config() {
        let config = config(&["-u", "a", "-H", "Referer: https://example.com/"]).unwrap();
        assert_eq!(
            config.fetch.headers.get("referer").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn malformed_header_fails() {
        assert!(matches!(
            config(&["-u", "a", "-H", "no-separator"]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn explicit_edgerc_wins() {
        let config = config(&["-u", "a", "-e", "/etc/purge.edgerc", "-s", "ccu"]).unwrap();
        assert_eq!(config.edgerc, Some(PathBuf::from("/etc/purge.edgerc")));
        assert_eq!(config.section, "ccu");
    }
}
