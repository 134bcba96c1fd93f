//! Cache purge submission: request model, the invalidation API seam and the
//! batch submitter that drives it.

mod audit;
mod client;
mod edgegrid;
mod submitter;

pub use audit::AuditLog;
pub use client::FastPurgeClient;
pub use edgegrid::{DEFAULT_MAX_BODY, EdgeGridCredentials, EdgeGridSigner};
pub use submitter::{BatchPlan, BatchSubmitter, SubmitSummary};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PurgeError;

/// Which edge network a purge applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Network {
    #[default]
    Production,
    Staging,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mark cached copies stale or remove them outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PurgeMethod {
    Invalidate,
    #[default]
    Delete,
}

impl PurgeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalidate => "invalidate",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for PurgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the objects of a request are addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PurgeTarget {
    #[default]
    Url,
    CpCode,
    CacheTag,
}

impl PurgeTarget {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::CpCode => "cpcode",
            Self::CacheTag => "tag",
        }
    }
}

/// One purge call: the objects of a single batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    pub network: Network,
    pub method: PurgeMethod,
    pub target: PurgeTarget,
    pub objects: Vec<String>,
}

impl PurgeRequest {
    pub fn urls(network: Network, method: PurgeMethod, objects: Vec<String>) -> Self {
        Self {
            network,
            method,
            target: PurgeTarget::Url,
            objects,
        }
    }

    /// API path for this request, e.g. `/ccu/v3/delete/url/production`.
    pub fn path(&self) -> String {
        format!(
            "/ccu/v3/{}/{}/{}",
            self.method.as_str(),
            self.target.path_segment(),
            self.network.as_str()
        )
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PurgeBody<'a> {
    pub objects: &'a [String],
}

/// Acknowledgement returned by the invalidation API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurgeResponse {
    pub http_status: u16,
    pub detail: String,
    pub estimated_seconds: Option<u64>,
    pub purge_id: Option<String>,
    pub support_id: Option<String>,
}

/// The external invalidation service.
#[async_trait]
pub trait PurgeApi: Send + Sync {
    async fn purge(&self, request: &PurgeRequest) -> Result<PurgeResponse, PurgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_paths() {
        let request = PurgeRequest::urls(Network::Staging, PurgeMethod::Invalidate, vec![]);
        assert_eq!(request.path(), "/ccu/v3/invalidate/url/staging");

        let request = PurgeRequest {
            network: Network::Production,
            method: PurgeMethod::Delete,
            target: PurgeTarget::CacheTag,
            objects: vec!["tag".into()],
        };
        assert_eq!(request.path(), "/ccu/v3/delete/tag/production");
    }

    #[test]
    fn response_deserializes_from_api_json() {
        let body = r#"{
            "httpStatus": 201,
            "detail": "Request accepted",
            "estimatedSeconds": 5,
            "purgeId": "e535071c-26b2-11e7-94d7-276f2f54d938",
            "supportId": "17PY1492793544958045-219026624"
        }"#;
        let response: PurgeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.http_status, 201);
        assert_eq!(response.estimated_seconds, Some(5));
        assert_eq!(
            response.purge_id.as_deref(),
            Some("e535071c-26b2-11e7-94d7-276f2f54d938")
        );
    }
}
