use std::collections::BTreeMap;
use std::time::Duration;

use edgar_fetch::{Transport, TransportError, TransportResponse};
use tracing::trace;

/// HTTP transport backed by a shared `reqwest::Client`.
///
/// Headers come from the caller on every request; nothing is baked into the
/// client. Non-2xx responses are returned, not turned into errors.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// A transport whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        let mut req = self.client.get(locator);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?;

        trace!(%locator, status, bytes = body.len(), "response");
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
