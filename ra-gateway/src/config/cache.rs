use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::hook::CacheMode;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Default TTL for cached responses.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Reads slower than this degrade to a miss.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    pub max_entries: u64,
    /// Mode applied when the request config doesn't specify one.
    pub default_mode: CacheMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(604_800),
            read_timeout: Duration::from_secs(2),
            max_entries: 100_000,
            default_mode: CacheMode::Simple,
        }
    }
}

#[cfg(feature = "testing")]
impl crate::tests::TestDefault for CacheConfig {
    fn test_default() -> Self {
        Self::default()
    }
}
