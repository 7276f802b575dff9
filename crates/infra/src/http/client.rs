use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, IntoUrl};
use tallybridge_domain::{Result, TallyError};
use tracing::{debug, warn};

use crate::errors::InfraError;

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const XML_ACCEPT: &str = "application/xml";

/// Pooled HTTP client that performs exactly one POST per call.
///
/// Retrying is the caller's job; this type only classifies the outcome.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// POST an XML payload and return the response body.
    ///
    /// 5xx statuses become [`TallyError::ConnectionFailed`] so the caller
    /// can retry them. Any other status hands the body back, since Tally
    /// reports its own errors inside the XML.
    pub async fn post_xml<U>(&self, url: U, payload: &str) -> Result<String>
    where
        U: IntoUrl,
    {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(ACCEPT, XML_ACCEPT)
            .body(payload.to_owned())
            .build()
            .map_err(|err| TallyError::from(InfraError::from(err)))?;

        let url = request.url().clone();
        debug!(%url, bytes = payload.len(), "sending XML request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| TallyError::from(InfraError::from(err)))?;

        let status = response.status();
        debug!(%url, %status, "received HTTP response");

        if status.is_server_error() {
            return Err(TallyError::ConnectionFailed(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            )));
        }

        if status.is_client_error() {
            warn!(%url, %status, "tally answered with a client error status; parsing body");
        }

        response.text().await.map_err(|err| {
            TallyError::ResponseParseFailed(format!("failed to read response body: {err}"))
        })
    }
}

/// Idle connections kept per host.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;
/// How long an idle pooled connection is kept.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30) }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .no_proxy()
            .build()
            .map_err(|err| {
                let infra: InfraError = err.into();
                TallyError::from(infra)
            })?;

        Ok(HttpClient { client })
    }
}
