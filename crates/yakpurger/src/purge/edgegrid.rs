// EdgeGrid credentials and EG1-HMAC-SHA256 request signing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use ::config::{Config, File, FileFormat, Map, Source, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CredentialsError, PurgeError};

type HmacSha256 = Hmac<Sha256>;

/// Default number of body bytes covered by the content hash.
pub const DEFAULT_MAX_BODY: usize = 131_072;

const AUTH_SCHEME: &str = "EG1-HMAC-SHA256";

#[derive(Clone, PartialEq, Eq)]
pub struct EdgeGridCredentials {
    pub client_token: String,
    pub client_secret: String,
    pub access_token: String,
    /// API hostname, e.g. `akab-xxxx.purge.akamaiapis.net`
    pub host: String,
    pub max_body: usize,
}

impl std::fmt::Debug for EdgeGridCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeGridCredentials")
            .field("host", &self.host)
            .field("client_token", &self.client_token)
            .field("max_body", &self.max_body)
            .finish_non_exhaustive()
    }
}

impl EdgeGridCredentials {
    /// `~/.edgerc`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".edgerc"))
    }

    /// Load one section of an `.edgerc` file.
    pub fn from_edgerc(path: &Path, section: &str) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_edgerc(&content, section).map_err(|e| match e {
            CredentialsError::MissingSection { section, .. } => CredentialsError::MissingSection {
                path: path.to_path_buf(),
                section,
            },
            other => other,
        })
    }

    /// Parse `.edgerc` content and extract `section`.
    ///
    /// INI rules apply: `=` or `:` separate keys from values and key names are
    /// case-insensitive.
    pub fn parse_edgerc(content: &str, section: &str) -> Result<Self, CredentialsError> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Ini))
            .build()
            .map_err(|e| CredentialsError::Malformed {
                reason: e.to_string(),
            })?;
        let sections: Map<String, Value> =
            settings.collect().map_err(|e| CredentialsError::Malformed {
                reason: e.to_string(),
            })?;

        let table = sections
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(section))
            .and_then(|(_, value)| value.into_table().ok())
            .ok_or_else(|| CredentialsError::MissingSection {
                path: PathBuf::new(),
                section: section.to_string(),
            })?;

        let values: HashMap<String, String> = table
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.into_string().ok()?;
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
                Some((key.to_ascii_lowercase(), value))
            })
            .collect();

        let get = |key: &'static str| -> Result<String, CredentialsError> {
            values
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| CredentialsError::MissingKey {
                    section: section.to_string(),
                    key,
                })
        };

        let max_body = match get("max-body").or_else(|_| get("max_body")) {
            Ok(raw) => raw.parse().map_err(|e| CredentialsError::InvalidValue {
                key: "max-body",
                reason: format!("{e}"),
            })?,
            Err(_) => DEFAULT_MAX_BODY,
        };

        let host = get("host")?;
        let host = host
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client_token: get("client_token")?,
            client_secret: get("client_secret")?,
            access_token: get("access_token")?,
            host,
            max_body,
        })
    }
}

/// Produces `Authorization` headers for EdgeGrid-protected APIs.
#[derive(Debug, Clone)]
pub struct EdgeGridSigner {
    credentials: EdgeGridCredentials,
}

impl EdgeGridSigner {
    pub fn new(credentials: EdgeGridCredentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &EdgeGridCredentials {
        &self.credentials
    }

    /// Sign a request with a fresh timestamp and nonce.
    pub fn authorization(
        &self,
        method: &str,
        url: &url::Url,
        body: &[u8],
    ) -> Result<String, PurgeError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.authorization_at(method, url, body, Utc::now(), &nonce)
    }

    /// Deterministic variant of [`Self::authorization`].
    pub fn authorization_at(
        &self,
        method: &str,
        url: &url::Url,
        body: &[u8],
        at: DateTime<Utc>,
        nonce: &str,
    ) -> Result<String, PurgeError> {
        let timestamp = at.format("%Y%m%dT%H:%M:%S+0000").to_string();
        let auth_prefix = format!(
            "{AUTH_SCHEME} client_token={};access_token={};timestamp={timestamp};nonce={nonce};",
            self.credentials.client_token, self.credentials.access_token
        );

        let host = match url.port() {
            Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
            None => url.host_str().unwrap_or_default().to_string(),
        };
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        let content_hash = if method.eq_ignore_ascii_case("POST") && !body.is_empty() {
            let covered = &body[..body.len().min(self.credentials.max_body)];
            BASE64.encode(Sha256::digest(covered))
        } else {
            String::new()
        };

        let data_to_sign = [
            method.to_ascii_uppercase().as_str(),
            url.scheme(),
            host.as_str(),
            path_and_query.as_str(),
            "",
            content_hash.as_str(),
            auth_prefix.as_str(),
        ]
        .join("\t");

        let signing_key = hmac_base64(self.credentials.client_secret.as_bytes(), &timestamp)?;
        let signature = hmac_base64(signing_key.as_bytes(), &data_to_sign)?;

        Ok(format!("{auth_prefix}signature={signature}"))
    }
}

fn hmac_base64(key: &[u8], data: &str) -> Result<String, PurgeError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| PurgeError::Signing {
        reason: format!("HMAC error: {e}"),
    })?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
