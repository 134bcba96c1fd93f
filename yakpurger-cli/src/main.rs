mod cli;
mod config;

use std::process;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use yakpurger::error::AppError;
use yakpurger_engine::{
    BatchSubmitter, EdgeGridCredentials, FastPurgeClient, HttpManifestFetcher, ManifestResolver,
    PurgeApi, SubmitSummary, discover, read_root_list, write_file_list,
};

use crate::cli::Args;
use crate::config::{ProgramConfig, RootInput};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let result = match ProgramConfig::from_args(args) {
        Ok(config) => run(&config, connect).await.map(|_| ()),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("{}", failure_message(&e));
        process::exit(1);
    }
}

/// Discover, write the file list, then purge through the client `connect` builds.
///
/// `connect` is only called once there is something to purge, so a dry run or
/// an empty discovery never touches credentials. Returns `None` when nothing
/// was submitted.
async fn run<A, F>(config: &ProgramConfig, connect: F) -> Result<Option<SubmitSummary>, AppError>
where
    A: PurgeApi,
    F: FnOnce(&ProgramConfig) -> Result<A, AppError>,
{
    let files = discover_files(config).await?;

    if config.dry_run {
        info!("Dry run, skipping purge");
        return Ok(None);
    }
    if files.is_empty() {
        info!("Nothing to purge");
        return Ok(None);
    }

    let submitter = BatchSubmitter::new(connect(config)?, config.purge.clone())?;
    let summary = submitter.submit(&files).await?;
    info!(
        submitted = summary.batches_submitted,
        skipped = summary.batches_skipped,
        objects = summary.objects_purged,
        "Purge complete"
    );
    Ok(Some(summary))
}

async fn discover_files(config: &ProgramConfig) -> Result<Vec<String>, AppError> {
    let roots = match &config.input {
        RootInput::Url(url) => vec![url.clone()],
        RootInput::File(path) => read_root_list(path).await?,
    };
    info!(roots = roots.len(), "Starting discovery");

    let resolver = ManifestResolver::new(HttpManifestFetcher::new(&config.fetch)?);
    let report = discover(
        &resolver,
        &roots,
        config.prefix.as_deref(),
        config.exclude_segments,
    )
    .await;

    if !report.failures.is_empty() {
        warn!(
            failed = report.failures.len(),
            resolved = report.roots_resolved(),
            "Some playlists could not be resolved"
        );
    }

    write_file_list(&config.output, &report.files).await?;
    info!(
        files = report.files.len(),
        output = %config.output.display(),
        "Wrote file list"
    );
    Ok(report.files)
}

fn connect(config: &ProgramConfig) -> Result<FastPurgeClient, AppError> {
    let edgerc = config.edgerc.clone().ok_or_else(|| {
        AppError::InvalidInput("no --edgerc given and no home directory found".to_string())
    })?;
    let credentials = EdgeGridCredentials::from_edgerc(&edgerc, &config.section)?;
    Ok(FastPurgeClient::new(credentials)?
        .with_account_switch_key(config.account_switch_key.clone()))
}

fn failure_message(e: &AppError) -> String {
    match e.resume_batch() {
        Some(batch) => format!("{e}; resume with --skipToBatch {batch}"),
        None => e.to_string(),
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
