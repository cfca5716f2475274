use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{status_error, GraphError, HttpBody, Transport};

/// `Transport` over reqwest, authenticating every request with a bearer token.
///
/// Cheap to clone; the inner client is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    access_token: String,
}

impl HttpTransport {
    /// `timeout = None` leaves reqwest's default in place, which never times out.
    pub fn new(access_token: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            access_token,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpBody, GraphError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        Ok(HttpBody { content_type, text })
    }
}
