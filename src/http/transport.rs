//! Raw HTTP transport behind the rate-limited client.
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode, Url,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{CensusError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT_VALUE: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Turns any non-2xx status into [`CensusError::UnexpectedStatus`].
    pub fn error_for_status(self, url: &Url) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        Err(CensusError::UnexpectedStatus {
            status: self.status.as_u16(),
            url: url.to_string(),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends a single GET request. Implementations must not retry; retry policy
/// lives in [`crate::http::client::RateLimitedClient`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<HttpResponse>;
}

/// Transport backed by reqwest.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<HttpResponse> {
        let request = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .build()?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(HttpResponse::new(status, headers, body))
    }
}
