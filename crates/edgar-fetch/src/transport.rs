use std::collections::BTreeMap;
use std::sync::Arc;

/// A fully-read HTTP response. Every status is returned as-is; the caller
/// decides what counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure: nothing usable came back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// Issues a single GET for a locator.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(
        &self,
        locator: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        (**self).get(locator, headers).await
    }
}
