pub mod logs;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use chrono::Utc;
use rustc_hash::FxHashMap as HashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{
        api::ApiError, internal::InternalError,
        invalid_req::InvalidRequestError,
    },
    store::StoreError,
    types::{
        agent::{Agent, Skill, SkillConfigVersion, SkillConfiguration},
        model::{AIProviderAPIKey, Model, ModelType},
        provider::InferenceProvider,
    },
};

/// Management surface for the entities the request pipeline reads:
/// agents, skills, configurations, models and provider keys.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/agents", post(create_agent))
        .route("/agents/{id}", delete(delete_agent))
        .route("/agents/{agent_id}/skills", post(create_skill))
        .route(
            "/skills/{skill_id}/configurations",
            post(create_configuration),
        )
        .route("/models", post(create_model))
        .route("/provider-keys", post(create_provider_key))
        .route("/logs", get(list_logs))
        .route("/logs/live", get(logs::live))
        .with_state(app_state)
}

fn store_error(error: StoreError) -> ApiError {
    match error {
        StoreError::DuplicateName(name) => {
            InvalidRequestError::DuplicateName(name).into()
        }
        other => InternalError::Store(other).into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateAgent {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

async fn create_agent(
    State(app_state): State<AppState>,
    Json(body): Json<CreateAgent>,
) -> Result<Json<Agent>, ApiError> {
    let mut agent = Agent::new(body.name);
    agent.description = body.description;
    agent.metadata = body.metadata;
    let agent = app_state
        .store()
        .create_agent(agent)
        .await
        .map_err(store_error)?;
    Ok(Json(agent))
}

async fn delete_agent(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<http::StatusCode, ApiError> {
    app_state
        .store()
        .delete_agent(id)
        .await
        .map_err(store_error)?;
    Ok(http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateSkill {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    max_configurations: Option<u32>,
}

async fn create_skill(
    State(app_state): State<AppState>,
    Path(agent_id): Path<Uuid>,
    Json(body): Json<CreateSkill>,
) -> Result<Json<Skill>, ApiError> {
    let mut skill = Skill::new(agent_id, body.name);
    skill.description = body.description;
    skill.metadata = body.metadata;
    if let Some(max_configurations) = body.max_configurations {
        skill.max_configurations = max_configurations;
    }
    let skill = app_state
        .store()
        .create_skill(skill)
        .await
        .map_err(store_error)?;
    Ok(Json(skill))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateConfiguration {
    name: String,
    data: HashMap<String, SkillConfigVersion>,
}

async fn create_configuration(
    State(app_state): State<AppState>,
    Path(skill_id): Path<Uuid>,
    Json(body): Json<CreateConfiguration>,
) -> Result<Json<SkillConfiguration>, ApiError> {
    let now = Utc::now();
    let configuration = SkillConfiguration {
        id: Uuid::now_v7(),
        skill_id,
        name: body.name,
        data: body.data,
        created_at: now,
        updated_at: now,
    };
    let configuration = app_state
        .store()
        .create_skill_configuration(configuration)
        .await
        .map_err(store_error)?;
    Ok(Json(configuration))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateModel {
    model_name: String,
    ai_provider_api_key_id: Uuid,
    #[serde(default)]
    model_type: ModelType,
    #[serde(default)]
    embedding_dimensions: Option<u32>,
}

async fn create_model(
    State(app_state): State<AppState>,
    Json(body): Json<CreateModel>,
) -> Result<Json<Model>, ApiError> {
    let now = Utc::now();
    let model = Model {
        id: Uuid::now_v7(),
        ai_provider_api_key_id: body.ai_provider_api_key_id,
        model_name: body.model_name,
        model_type: body.model_type,
        embedding_dimensions: body.embedding_dimensions,
        created_at: now,
        updated_at: now,
    };
    let model = app_state
        .store()
        .create_model(model)
        .await
        .map_err(store_error)?;
    Ok(Json(model))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateProviderKey {
    ai_provider: InferenceProvider,
    /// Plaintext on the way in; stored encrypted.
    api_key: String,
    #[serde(default)]
    custom_fields: serde_json::Map<String, serde_json::Value>,
}

async fn create_provider_key(
    State(app_state): State<AppState>,
    Json(body): Json<CreateProviderKey>,
) -> Result<Json<AIProviderAPIKey>, ApiError> {
    let encrypted = app_state.0.encryptor.encrypt(&body.api_key)?;
    let now = Utc::now();
    let key = AIProviderAPIKey {
        id: Uuid::now_v7(),
        ai_provider: body.ai_provider,
        api_key: encrypted,
        custom_fields: body.custom_fields,
        created_at: now,
        updated_at: now,
    };
    let key = app_state
        .store()
        .create_provider_api_key(key)
        .await
        .map_err(store_error)?;
    Ok(Json(key))
}

#[derive(Debug, Deserialize)]
struct ListLogsQuery {
    #[serde(default)]
    agent_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn list_logs(
    State(app_state): State<AppState>,
    axum::extract::Query(query): axum::extract::Query<ListLogsQuery>,
) -> Result<Json<Vec<crate::types::log::Log>>, ApiError> {
    let logs = app_state
        .store()
        .list_logs(query.agent_id, query.limit)
        .await
        .map_err(store_error)?;
    Ok(Json(logs))
}
