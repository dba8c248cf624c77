pub mod fingerprint;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use displaydoc::Display;
use thiserror::Error;

use crate::config::cache::CacheConfig;

/// Cache backend errors. These are always demoted to a miss by the caller.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum CacheError {
    /// Cache backend unavailable: {0}
    Backend(String),
    /// Cache read timed out
    ReadTimeout,
}

/// One cached canonical response body.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub ttl: Duration,
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit { key: String, value: String },
    Miss,
    /// A runtime bypass (`force_refresh`) skipped the read.
    Refresh,
    Disabled,
}

/// Swappable key/value store with per-entry TTL.
#[async_trait]
pub trait CacheStorageConnector: Send + Sync + std::fmt::Debug {
    async fn get_cache(
        &self,
        key: &str,
    ) -> Result<Option<CacheRecord>, CacheError>;

    async fn set_cache(
        &self,
        key: String,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;
}

struct RecordExpiry;

impl moka::Expiry<String, CacheRecord> for RecordExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        record: &CacheRecord,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(record.ttl)
    }
}

/// In-memory cache backend on moka with per-entry expiry.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    inner: moka::future::Cache<String, CacheRecord>,
    default_ttl: Duration,
}

impl InMemoryCache {
    #[must_use]
    pub fn new(max_entries: u64, default_ttl: Duration) -> Self {
        let inner = moka::future::Cache::builder()
            .max_capacity(max_entries)
            .expire_after(RecordExpiry)
            .build();
        Self { inner, default_ttl }
    }
}

#[async_trait]
impl CacheStorageConnector for InMemoryCache {
    async fn get_cache(
        &self,
        key: &str,
    ) -> Result<Option<CacheRecord>, CacheError> {
        Ok(self.inner.get(key).await)
    }

    async fn set_cache(
        &self,
        key: String,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let record = CacheRecord {
            value,
            expires_at: Utc::now()
                + chrono::Duration::from_std(ttl)
                    .unwrap_or_else(|_| chrono::Duration::seconds(0)),
            ttl,
        };
        self.inner.insert(key, record).await;
        Ok(())
    }
}

/// Shared handle over the configured cache backend, applying the read
/// timeout and the miss-on-failure policy.
#[derive(Debug, Clone)]
pub struct CacheClient {
    connector: Arc<dyn CacheStorageConnector>,
    read_timeout: Duration,
    default_ttl: Duration,
}

impl CacheClient {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let connector: Arc<dyn CacheStorageConnector> = Arc::new(
            InMemoryCache::new(config.max_entries, config.max_age),
        );
        Self::with_connector(connector, config)
    }

    #[must_use]
    pub fn with_connector(
        connector: Arc<dyn CacheStorageConnector>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            connector,
            read_timeout: config.read_timeout,
            default_ttl: config.max_age,
        }
    }

    /// Reads `key`, degrading to a miss on backend failure or timeout.
    pub async fn get(&self, key: &str) -> CacheLookup {
        let read = self.connector.get_cache(key);
        match tokio::time::timeout(self.read_timeout, read).await {
            Ok(Ok(Some(record))) => CacheLookup::Hit {
                key: key.to_string(),
                value: record.value,
            },
            Ok(Ok(None)) => CacheLookup::Miss,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "cache read failed, treating as miss");
                CacheLookup::Miss
            }
            Err(_elapsed) => {
                tracing::warn!("cache read timed out, treating as miss");
                CacheLookup::Miss
            }
        }
    }

    /// Best-effort write; failures are logged and swallowed.
    pub async fn put(&self, key: String, value: String) {
        if let Err(e) = self
            .connector
            .set_cache(key, value, Some(self.default_ttl))
            .await
        {
            tracing::warn!(error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CacheClient {
        CacheClient::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn absent_key_is_a_miss() {
        let client = client();
        assert_eq!(client.get("missing").await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn written_key_is_a_hit() {
        let client = client();
        client.put("k".to_string(), "v".to_string()).await;
        assert_eq!(
            client.get("k").await,
            CacheLookup::Hit {
                key: "k".to_string(),
                value: "v".to_string()
            }
        );
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_miss() {
        #[derive(Debug)]
        struct FailingBackend;

        #[async_trait]
        impl CacheStorageConnector for FailingBackend {
            async fn get_cache(
                &self,
                _key: &str,
            ) -> Result<Option<CacheRecord>, CacheError> {
                Err(CacheError::Backend("down".to_string()))
            }

            async fn set_cache(
                &self,
                _key: String,
                _value: String,
                _ttl: Option<Duration>,
            ) -> Result<(), CacheError> {
                Err(CacheError::Backend("down".to_string()))
            }
        }

        let client = CacheClient::with_connector(
            Arc::new(FailingBackend),
            &CacheConfig::default(),
        );
        assert_eq!(client.get("k").await, CacheLookup::Miss);
        // writes are best effort and must not panic
        client.put("k".to_string(), "v".to_string()).await;
    }
}
