//! Result cache
//!
//! - `CacheStore` trait: string values with per-entry TTL
//! - `RestKvCache`: remote REST key-value store
//! - `MemoryCache`: in-process fallback when no remote store is configured
//! - `JsonCache`: typed wrapper that never fails its caller

pub mod json;
pub mod memory;
#[cfg(test)]
pub mod mock;
pub mod rest;
pub mod traits;

pub use json::{CacheWrite, JsonCache};
pub use memory::MemoryCache;
pub use rest::RestKvCache;
pub use traits::CacheStore;

use std::sync::Arc;
use std::time::Duration;

/// Entry limit for the in-process fallback
pub const MEMORY_CACHE_CAPACITY: u64 = 10_000;

/// Build the configured backend: REST when a URL is set, memory otherwise.
pub fn from_config(
    url: Option<&str>,
    token: Option<&str>,
    timeout: Duration,
) -> anyhow::Result<Arc<dyn CacheStore>> {
    match url.filter(|u| !u.is_empty()) {
        Some(url) => {
            tracing::info!("Using REST cache at {}", url);
            Ok(Arc::new(RestKvCache::new(url, token.unwrap_or_default(), timeout)?))
        }
        None => {
            tracing::info!("No cache URL configured, using in-memory cache");
            Ok(Arc::new(MemoryCache::new(MEMORY_CACHE_CAPACITY)))
        }
    }
}
