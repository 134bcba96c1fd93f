// Discovery Driver: resolves every root manifest and merges the results into one sorted list.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{error, info};

use crate::error::ManifestError;
use crate::manifest::{ManifestResolver, ManifestSource};

/// A root manifest that could not be resolved.
#[derive(Debug)]
pub struct RootFailure {
    pub uri: String,
    pub error: ManifestError,
}

#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Every discovered file, deduplicated and sorted lexicographically.
    pub files: Vec<String>,
    /// Non-blank roots that were attempted.
    pub roots_attempted: usize,
    pub failures: Vec<RootFailure>,
}

impl DiscoveryReport {
    pub fn roots_resolved(&self) -> usize {
        self.roots_attempted - self.failures.len()
    }
}

/// Resolve each root URI and merge everything found.
///
/// Blank roots are skipped. `prefix` is prepended verbatim to every root.
/// A root that fails is logged and recorded; the remaining roots still run.
pub async fn discover<S, I>(
    resolver: &ManifestResolver<S>,
    roots: I,
    prefix: Option<&str>,
    exclude_segments: bool,
) -> DiscoveryReport
where
    S: ManifestSource,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut all_files = BTreeSet::new();
    let mut report = DiscoveryReport::default();

    for root in roots {
        let root = root.as_ref().trim();
        if root.is_empty() {
            continue;
        }
        let uri = match prefix {
            Some(prefix) => format!("{prefix}{root}"),
            None => root.to_string(),
        };
        report.roots_attempted += 1;

        info!(uri = %uri, "Parsing playlist");
        match resolver.resolve_uri(&uri, exclude_segments).await {
            Ok(files) => {
                info!(uri = %uri, files = files.len(), "Found files");
                all_files.extend(files);
            }
            Err(e) => {
                error!(uri = %uri, error = %e, "Failed to resolve playlist, skipping");
                report.failures.push(RootFailure { uri, error: e });
            }
        }
    }

    report.files = all_files.into_iter().collect();
    report
}

/// Read a newline-delimited list of root manifest URIs.
pub async fn read_root_list(path: &Path) -> std::io::Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Write the discovered list, one URI per line, replacing any previous file.
pub async fn write_file_list(path: &Path, files: &[String]) -> std::io::Result<()> {
    tokio::fs::write(path, files.join("\n")).await
}
