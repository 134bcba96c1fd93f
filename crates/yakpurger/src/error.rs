use reqwest::StatusCode;
use std::path::PathBuf;

/// Failure of a single HTTP exchange while retrieving a manifest.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status}")]
    HttpStatus { status: StatusCode },
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source } => !source.is_builder() && !source.is_redirect(),
            Self::HttpStatus { .. } => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to fetch manifest `{uri}` after {attempts} attempt(s): {cause}")]
    Fetch {
        uri: String,
        attempts: u32,
        #[source]
        cause: TransportError,
    },

    #[error("failed to parse manifest `{uri}`: {reason}")]
    Parse { uri: String, reason: String },

    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },
}

impl ManifestError {
    pub fn fetch(uri: impl Into<String>, attempts: u32, cause: TransportError) -> Self {
        Self::Fetch {
            uri: uri.into(),
            attempts,
            cause,
        }
    }

    pub fn parse(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// The manifest URI this error is about.
    pub fn uri(&self) -> &str {
        match self {
            Self::Fetch { uri, .. } | Self::Parse { uri, .. } => uri,
            Self::InvalidUrl { input, .. } => input,
        }
    }
}

/// Failure reported by the invalidation API collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PurgeError {
    #[error("purge request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("purge API rejected request with HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("failed to encode purge request: {source}")]
    Encode {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to sign purge request: {reason}")]
    Signing { reason: String },

    #[error("invalid purge endpoint: {reason}")]
    Endpoint { reason: String },
}

impl PurgeError {
    pub fn http_status(status: StatusCode, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS)
    }
}

/// A batch could not be submitted; the run stops here and can be resumed from
/// `batch_index`.
#[derive(Debug, thiserror::Error)]
#[error("batch {batch_index} failed: {cause}")]
pub struct BatchError {
    pub batch_index: usize,
    #[source]
    pub cause: PurgeError,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("failed to read credentials file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credentials file: {reason}")]
    Malformed { reason: String },

    #[error("section [{section}] not found in {}", path.display())]
    MissingSection { path: PathBuf, section: String },

    #[error("key `{key}` missing from section [{section}]")]
    MissingKey { section: String, key: &'static str },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("failed to build HTTP client: {source}")]
    Client {
        #[from]
        source: reqwest::Error,
    },

    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
}
