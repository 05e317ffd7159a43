//! Upstream Feed Module
//!
//! Port for the raw GPS feed and its HTTP adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SppoError};

/// Pause before retry `n` is `n * RETRY_BACKOFF`.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

// == Feed Source ==
/// Anything that can hand back the raw upstream record array.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the full raw array. A payload that is not a JSON array is an
    /// [`SppoError::Upstream`].
    async fn fetch_raw(&self) -> Result<Vec<Value>>;
}

/// Unwraps a top-level JSON array.
pub fn into_array(body: Value) -> Result<Vec<Value>> {
    let kind = match body {
        Value::Array(records) => return Ok(records),
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Object(_) => "an object",
    };
    Err(SppoError::Upstream(format!("expected a JSON array, got {kind}")))
}

// == HTTP Feed ==
/// Reads the feed over HTTP with a fixed timeout and retry count.
///
/// Certificate validation is disabled: the public SPPO endpoint has served
/// broken chains in the past. Do not reuse this client for anything else.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    url: String,
    retry_count: u32,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration, retry_count: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| SppoError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            retry_count,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.sppo_api_url.clone(),
            Duration::from_millis(config.api_timeout_ms),
            config.api_retry_count,
        )
    }

    async fn request(&self) -> std::result::Result<Value, reqwest::Error> {
        self.client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch_raw(&self) -> Result<Vec<Value>> {
        let mut attempt = 0;
        let body = loop {
            match self.request().await {
                Ok(body) => break body,
                Err(e) if attempt < self.retry_count => {
                    attempt += 1;
                    warn!(url = %self.url, attempt, error = %e, "Upstream request failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => {
                    return Err(SppoError::Upstream(format!(
                        "request to {} failed after {} attempt(s): {}",
                        self.url,
                        attempt + 1,
                        e
                    )));
                }
            }
        };

        let records = into_array(body)?;
        debug!(records = records.len(), "Upstream payload received");
        Ok(records)
    }
}
