use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct DispatcherConfig {
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,
    /// Per-attempt timeout for one upstream call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Total wall-clock budget across all retry attempts.
    #[serde(with = "humantime_serde")]
    pub total_budget: Duration,
    /// Cap applied to `retry-after` values advertised by providers.
    #[serde(with = "humantime_serde")]
    pub retry_after_cap: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            total_budget: Duration::from_secs(300),
            retry_after_cap: Duration::from_secs(60),
        }
    }
}

#[cfg(feature = "testing")]
impl crate::tests::TestDefault for DispatcherConfig {
    fn test_default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
            total_budget: Duration::from_secs(10),
            retry_after_cap: Duration::from_secs(1),
        }
    }
}
