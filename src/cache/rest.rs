//! REST key-value cache client
//!
//! Speaks the Upstash-style REST protocol:
//! - `GET  {url}/get/{key}` → `{"result": "<value>" | null}`
//! - `POST {url}/set/{key}?EX={seconds}` with the value as body → `{"result": "OK"}`
//!
//! Errors come back as `{"error": "..."}` with a non-2xx status.

use super::traits::CacheStore;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Remote cache reached over HTTP
pub struct RestKvCache {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKvCache {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build cache HTTP client")?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn decode(response: reqwest::Response, op: &str) -> Result<Option<serde_json::Value>> {
        let status = response.status();
        let body: RestResponse = response
            .json()
            .await
            .with_context(|| format!("Cache {} returned an unreadable body ({})", op, status))?;

        if let Some(error) = body.error {
            return Err(anyhow!("Cache {} failed ({}): {}", op, status, error));
        }
        if !status.is_success() {
            return Err(anyhow!("Cache {} failed with status {}", op, status));
        }
        Ok(body.result)
    }
}

#[async_trait]
impl CacheStore for RestKvCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let url = format!("{}/get/{}", self.url, urlencoding::encode(key));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Cache GET request failed")?;

        match Self::decode(response, "GET").await? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let url = format!(
            "{}/set/{}?EX={}",
            self.url,
            urlencoding::encode(key),
            ttl.as_secs().max(1)
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .context("Cache SET request failed")?;

        Self::decode(response, "SET").await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}
