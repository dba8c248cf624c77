use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    agent::ConfigurationParams,
    hook::{CacheMode, Hook},
    provider::InferenceProvider,
    secret::Secret,
};
use crate::config::retry::RetryConfig;

/// Header names carrying the per-request JSON config. Both are treated as
/// aliases.
pub const CONFIG_HEADER: &str = "x-idk-config";
pub const CONFIG_HEADER_ALIAS: &str = "ra-config";

/// One dispatch target as supplied by the client, before resolution.
///
/// Exactly one of `configuration_name` or `provider` must be set; the
/// resolver enforces this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestTargetPreProcessed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<InferenceProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_variables: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_ai_foundry_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl RequestTargetPreProcessed {
    /// Whether the target names exactly one of a stored configuration or a
    /// direct provider.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.configuration_name.is_some() != self.provider.is_some()
    }
}

/// The parsed `x-idk-config` / `ra-config` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfigPreProcessed {
    pub agent_name: String,
    pub skill_name: String,
    pub targets: Vec<RequestTargetPreProcessed>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Incoming header names copied onto the outbound provider request.
    #[serde(default)]
    pub forward_headers: Vec<String>,
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default)]
    pub force_hook_refresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMode>,
}

/// A fully resolved dispatch target: provider, model, credentials and the
/// merged configuration parameters.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub provider: InferenceProvider,
    pub model: Option<String>,
    pub api_key: Option<Secret<String>>,
    pub params: ConfigurationParams,
    pub custom_host: Option<String>,
    pub azure_ai_foundry_url: Option<Url>,
    pub weight: f64,
    pub cache: Option<CacheMode>,
    pub retry: Option<RetryConfig>,
}
