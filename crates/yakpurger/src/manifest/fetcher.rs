// Manifest Fetcher: retrieves one manifest URI and parses it, retrying transport failures.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{Manifest, parse_manifest};
use crate::config::FetchConfig;
use crate::error::{ConfigError, ManifestError, TransportError};
use crate::retry::{RetryAction, RetryPolicy, retry_with_backoff};

/// Anything that can turn a manifest URI into a parsed [`Manifest`].
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Manifest, ManifestError>;
}

/// HTTP implementation of [`ManifestSource`].
#[derive(Debug, Clone)]
pub struct HttpManifestFetcher {
    client: Client,
    retry: RetryPolicy,
}

enum AttemptError {
    Transport(TransportError),
    Manifest(ManifestError),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => e.fmt(f),
            Self::Manifest(e) => e.fmt(f),
        }
    }
}

impl HttpManifestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: config.build_client()?,
            retry: config.retry.clone(),
        })
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, url: &Url, uri: &str) -> RetryAction<Manifest, AttemptError> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return classify(TransportError::from(e)),
        };

        let status = response.status();
        if !status.is_success() {
            return classify(TransportError::HttpStatus { status });
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return classify(TransportError::from(e)),
        };

        match parse_manifest(uri, &bytes) {
            Ok(manifest) => RetryAction::Success(manifest),
            Err(e) => RetryAction::Fail(AttemptError::Manifest(e)),
        }
    }
}

fn classify(error: TransportError) -> RetryAction<Manifest, AttemptError> {
    if error.is_retryable() {
        RetryAction::Retry(AttemptError::Transport(error))
    } else {
        RetryAction::Fail(AttemptError::Transport(error))
    }
}

#[async_trait]
impl ManifestSource for HttpManifestFetcher {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, uri: &str) -> Result<Manifest, ManifestError> {
        let url = Url::parse(uri.trim()).map_err(|e| ManifestError::invalid_url(uri, e.to_string()))?;
        debug!(url = %url, "Fetching manifest");

        retry_with_backoff(&self.retry, |_| self.attempt(&url, uri))
            .await
            .map_err(|exhausted| match exhausted.error {
                AttemptError::Transport(cause) => {
                    ManifestError::fetch(uri, exhausted.attempts, cause)
                }
                AttemptError::Manifest(e) => e,
            })
    }
}
