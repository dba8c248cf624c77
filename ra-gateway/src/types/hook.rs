use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Input,
    Output,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HookProviderKind {
    Http,
    Llm,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Disabled,
    #[default]
    Simple,
    Semantic,
}

impl CacheMode {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        !matches!(self, CacheMode::Disabled)
    }
}

/// A pluggable pre/post dispatch step declared in the request config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub hook_type: HookType,
    pub hook_provider: HookProviderKind,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    /// When false, the hook still runs but its result never gates the
    /// response.
    #[serde(default = "default_await", rename = "await")]
    pub await_result: bool,
    #[serde(default)]
    pub cache_mode: CacheMode,
}

fn default_await() -> bool {
    true
}

/// The outcome a hook provider must return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookResult {
    pub deny_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_override: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body_override: Option<serde_json::Value>,
    pub skipped: bool,
}

impl HookResult {
    /// Result recorded when a hook could not run at all.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// One entry in a log's `hook_logs`, ordered like the request's hook list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookLog {
    pub hook_id: Uuid,
    pub hook_type: HookType,
    pub hook_provider: HookProviderKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Always `end_time - start_time`, in milliseconds.
    pub duration: i64,
    pub result: HookResult,
    pub cache_status: super::log::CacheStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
