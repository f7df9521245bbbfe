//! Fail-open JSON cache
//!
//! Every failure (transport, decode, encode) is logged and turned into a miss
//! or a skipped write. Nothing here returns an error to the caller.

use super::traits::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a best-effort cache write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Skipped(String),
}

/// Typed, best-effort wrapper over a [`CacheStore`]
#[derive(Clone)]
pub struct JsonCache {
    store: Arc<dyn CacheStore>,
}

impl JsonCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read and decode `key`. Any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    key,
                    backend = self.store.backend_name(),
                    "Cache read failed, treating as miss: {:#}",
                    e
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, "Cached value does not decode, treating as miss: {}", e);
                None
            }
        }
    }

    /// Encode and store `value`. Failures are logged and reported, never raised.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> CacheWrite {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, "Value not cacheable: {}", e);
                return CacheWrite::Skipped(e.to_string());
            }
        };

        match self.store.set(key, &raw, ttl).await {
            Ok(()) => CacheWrite::Stored,
            Err(e) => {
                tracing::warn!(
                    key,
                    backend = self.store.backend_name(),
                    "Cache write failed, skipping: {:#}",
                    e
                );
                CacheWrite::Skipped(format!("{:#}", e))
            }
        }
    }
}
