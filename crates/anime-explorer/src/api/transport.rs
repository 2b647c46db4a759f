//! The network-call primitive.
//!
//! Everything that talks to the network goes through [`Transport`], so the
//! throttle can wrap it as a decorator and tests can replace it.

use super::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// Raw HTTP response: status plus the undecoded body
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a GET request and hands back the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> ApiResult<RawResponse>;
}

/// Transport backed by a reqwest client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport; `timeout` of None leaves requests unbounded
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> ApiResult<RawResponse> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        debug!(url = %url, status = %status, bytes = body.len(), "Response received");
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> ApiResult<RawResponse> {
        (**self).get(url).await
    }
}
