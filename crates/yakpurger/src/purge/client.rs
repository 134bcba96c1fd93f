// Fast Purge client: HTTP implementation of the invalidation API.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{
    EdgeGridCredentials, EdgeGridSigner, Network, PurgeApi, PurgeBody, PurgeMethod, PurgeRequest,
    PurgeResponse, PurgeTarget,
};
use crate::error::PurgeError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct FastPurgeClient {
    client: Client,
    signer: EdgeGridSigner,
    endpoint: Url,
    account_switch_key: Option<String>,
}

impl FastPurgeClient {
    /// Client for `https://{credentials.host}`.
    pub fn new(credentials: EdgeGridCredentials) -> Result<Self, PurgeError> {
        let endpoint = Url::parse(&format!("https://{}/", credentials.host)).map_err(|e| {
            PurgeError::Endpoint {
                reason: format!("invalid host `{}`: {e}", credentials.host),
            }
        })?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            signer: EdgeGridSigner::new(credentials),
            endpoint,
            account_switch_key: None,
        })
    }

    /// Send requests to `endpoint` instead of the credentials host.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_account_switch_key(mut self, key: Option<String>) -> Self {
        self.account_switch_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url_for(&self, path: &str) -> Result<Url, PurgeError> {
        let mut url = self.endpoint.join(path).map_err(|e| PurgeError::Endpoint {
            reason: format!("cannot join `{path}`: {e}"),
        })?;
        if let Some(key) = &self.account_switch_key {
            url.query_pairs_mut().append_pair("accountSwitchKey", key);
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: PurgeMethod,
        target: PurgeTarget,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        let request = PurgeRequest {
            network,
            method,
            target,
            objects,
        };
        self.purge(&request).await
    }

    pub async fn invalidate_by_url(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Invalidate, PurgeTarget::Url, network, objects)
            .await
    }

    pub async fn invalidate_by_cp_code(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Invalidate, PurgeTarget::CpCode, network, objects)
            .await
    }

    pub async fn invalidate_by_cache_tag(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Invalidate, PurgeTarget::CacheTag, network, objects)
            .await
    }

    pub async fn delete_by_url(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Delete, PurgeTarget::Url, network, objects)
            .await
    }

    pub async fn delete_by_cp_code(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Delete, PurgeTarget::CpCode, network, objects)
            .await
    }

    pub async fn delete_by_cache_tag(
        &self,
        network: Network,
        objects: Vec<String>,
    ) -> Result<PurgeResponse, PurgeError> {
        self.send(PurgeMethod::Delete, PurgeTarget::CacheTag, network, objects)
            .await
    }
}

#[async_trait]
impl PurgeApi for FastPurgeClient {
    #[instrument(skip_all, fields(path = %request.path(), objects = request.objects.len()))]
    async fn purge(&self, request: &PurgeRequest) -> Result<PurgeResponse, PurgeError> {
        let url = self.url_for(&request.path())?;
        let body = serde_json::to_vec(&PurgeBody {
            objects: &request.objects,
        })?;
        let authorization = self.signer.authorization("POST", &url, &body)?;
        let authorization =
            HeaderValue::from_str(&authorization).map_err(|e| PurgeError::Signing {
                reason: e.to_string(),
            })?;

        debug!(url = %url, "Submitting purge request");
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PurgeError::http_status(status, body));
        }

        let ack: PurgeResponse = response.json().await?;
        debug!(
            http_status = ack.http_status,
            purge_id = ack.purge_id.as_deref().unwrap_or("-"),
            estimated_seconds = ?ack.estimated_seconds,
            "Purge request accepted"
        );
        Ok(ack)
    }
}
