//! CacheStore trait definition
//!
//! Abstract key-value cache with per-entry time-to-live. Implementations
//! report transport failures as errors; callers that want fail-open
//! behaviour go through [`JsonCache`](super::JsonCache).

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Abstract interface for a string key-value cache with TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}
