use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{PurgeRequest, PurgeResponse};

/// Append-only record of accepted purge requests.
///
/// One tab-separated line per purged object:
/// `timestamp  method  network  batch=N  purge_id  object`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(
        &self,
        batch_index: usize,
        request: &PurgeRequest,
        response: &PurgeResponse,
    ) -> std::io::Result<()> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let purge_id = response.purge_id.as_deref().unwrap_or("-");

        let mut entry = String::new();
        for object in &request.objects {
            entry.push_str(&format!(
                "{timestamp}\t{}\t{}\tbatch={batch_index}\t{purge_id}\t{object}\n",
                request.method, request.network
            ));
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}
