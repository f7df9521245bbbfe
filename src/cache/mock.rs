//! Cache backend that always fails, for exercising fail-open paths

use super::traits::CacheStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("cache unavailable"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(anyhow!("cache unavailable"))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
