use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version key that always points at the live configuration version.
pub const CURRENT_VERSION_KEY: &str = "current";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            metadata: HashMap::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default = "default_max_configurations")]
    pub max_configurations: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Skill {
    #[must_use]
    pub fn new(agent_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            agent_id,
            name: name.into(),
            description: None,
            metadata: HashMap::default(),
            max_configurations: default_max_configurations(),
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_max_configurations() -> u32 {
    10
}

/// A named bundle of versioned dispatch parameters owned by a skill.
///
/// `data` maps version keys to parameter snapshots; the reserved key
/// [`CURRENT_VERSION_KEY`] denotes the live version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfiguration {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub name: String,
    pub data: HashMap<String, SkillConfigVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillConfiguration {
    #[must_use]
    pub fn version(&self, key: Option<&str>) -> Option<&SkillConfigVersion> {
        self.data.get(key.unwrap_or(CURRENT_VERSION_KEY))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillConfigVersion {
    pub params: ConfigurationParams,
}

/// Dispatch parameters stored in a configuration version.
///
/// `system_prompt` may contain `{{variable}}` placeholders rendered at
/// dispatch time from the request's `system_prompt_variables`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Provider-specific parameters merged verbatim into the outbound body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_params: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A tool definition captured from a chat-completion request, recorded once
/// per `(agent, hash)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub name: String,
    /// SHA-256 over the deterministically serialized tool JSON.
    pub hash: String,
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
