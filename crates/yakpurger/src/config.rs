use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ConfigError;
use crate::purge::{Network, PurgeMethod};
use crate::retry::RetryPolicy;

pub const DEFAULT_USER_AGENT: &str = concat!("yakpurger/", env!("CARGO_PKG_VERSION"));

/// Default number of objects per purge request.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Options for retrieving manifests
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall timeout for one HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Retry behaviour for transport failures
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetchConfig::get_default_headers(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "application/vnd.apple.mpegurl,application/x-mpegurl,audio/mpegurl,*/*;q=0.8",
            ),
        );

        default_headers
    }

    /// Add a header given as raw strings, overriding any default of the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Build the HTTP client used for manifest requests.
    pub fn build_client(&self) -> Result<Client, ConfigError> {
        let redirect = if self.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .default_headers(self.headers.clone())
            .redirect(redirect)
            .build()?;
        Ok(client)
    }
}

/// Options for the batch submission stage.
#[derive(Debug, Clone)]
pub struct PurgeOptions {
    /// Maximum objects per request
    pub batch_size: usize,

    pub network: Network,

    pub method: PurgeMethod,

    /// Batches with an index below this are not submitted
    pub resume_from_batch: Option<usize>,

    /// Append-only audit log of successful submissions
    pub log_file: Option<PathBuf>,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            network: Network::default(),
            method: PurgeMethod::default(),
            resume_from_batch: None,
            log_file: None,
        }
    }
}

impl PurgeOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}
