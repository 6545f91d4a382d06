use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue, PRAGMA};
use serde_json::Value;

use crate::dto::QueryPayload;

pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Sends one query payload and returns the parsed JSON response body.
#[async_trait]
pub trait AnnotationTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &QueryPayload) -> Result<Value, TransportError>;
}

/// HTTP transport. Any response whose body parses as JSON is a success,
/// regardless of status code.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        // No cookie store: credentials are never attached.
        let client = reqwest::Client::builder().referer(false).build()?;
        Ok(Self { client })
    }

    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnnotationTransport for ReqwestTransport {
    async fn post(&self, url: &str, payload: &QueryPayload) -> Result<Value, TransportError> {
        let body = serde_json::to_string(payload)?;

        tracing::debug!("Posting {} bytes to {}", body.len(), url);

        // Same headers a browser attaches to a string body fetched with cache: "no-cache".
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=UTF-8"))
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .header(PRAGMA, HeaderValue::from_static("no-cache"))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send query to {}: {}", url, e);
                e
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!("Response from {}: status {}, {} bytes", url, status, bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("Response from {} is not JSON: {}", url, e);
            e.into()
        })
    }
}
