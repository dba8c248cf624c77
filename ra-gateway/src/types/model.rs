use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::InferenceProvider;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[default]
    Text,
    Embed,
}

/// A model registered in the store, pointing at the provider key used to
/// dispatch to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub ai_provider_api_key_id: Uuid,
    pub model_name: String,
    #[serde(default)]
    pub model_type: ModelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dimensions: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored provider credential. `api_key` holds the AES-256-GCM ciphertext,
/// base64 encoded; decryption happens during request resolution only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIProviderAPIKey {
    pub id: Uuid,
    pub ai_provider: InferenceProvider,
    pub api_key: String,
    #[serde(default)]
    pub custom_fields: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
