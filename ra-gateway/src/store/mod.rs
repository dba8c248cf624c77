pub mod memory;

use async_trait::async_trait;
use displaydoc::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{
    agent::{Agent, Skill, SkillConfiguration, Tool},
    log::{EvaluationRun, Feedback, Log},
    model::{AIProviderAPIKey, Model},
};

/// Storage backend errors.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum StoreError {
    /// Duplicate name: {0}
    DuplicateName(String),
    /// Storage backend unavailable: {0}
    Backend(String),
}

/// Swappable persistent store for the gateway's entities.
///
/// The in-memory implementation in [`memory`] is the default; remote
/// backends implement the same trait.
#[async_trait]
pub trait UserDataStorageConnector: Send + Sync + std::fmt::Debug {
    async fn create_agent(&self, agent: Agent) -> Result<Agent, StoreError>;
    async fn get_agent_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Agent>, StoreError>;
    /// Deleting an agent cascades to its skills, configurations and logs.
    async fn delete_agent(&self, id: Uuid) -> Result<(), StoreError>;

    async fn create_skill(&self, skill: Skill) -> Result<Skill, StoreError>;
    async fn get_skill(
        &self,
        agent_id: Uuid,
        name: &str,
    ) -> Result<Option<Skill>, StoreError>;

    async fn create_skill_configuration(
        &self,
        configuration: SkillConfiguration,
    ) -> Result<SkillConfiguration, StoreError>;
    async fn get_skill_configuration(
        &self,
        skill_id: Uuid,
        name: &str,
    ) -> Result<Option<SkillConfiguration>, StoreError>;

    async fn create_model(&self, model: Model) -> Result<Model, StoreError>;
    async fn get_model(&self, id: Uuid) -> Result<Option<Model>, StoreError>;

    async fn create_provider_api_key(
        &self,
        key: AIProviderAPIKey,
    ) -> Result<AIProviderAPIKey, StoreError>;
    async fn get_provider_api_key(
        &self,
        id: Uuid,
    ) -> Result<Option<AIProviderAPIKey>, StoreError>;

    /// Records a tool once per `(agent, hash)`; returns whether a new
    /// record was inserted.
    async fn upsert_tool(&self, tool: Tool) -> Result<bool, StoreError>;
    async fn list_tools(&self, agent_id: Uuid)
    -> Result<Vec<Tool>, StoreError>;

    async fn insert_log(&self, log: Log) -> Result<(), StoreError>;
    async fn list_logs(
        &self,
        agent_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Log>, StoreError>;

    async fn insert_evaluation_run(
        &self,
        run: EvaluationRun,
    ) -> Result<(), StoreError>;
    async fn insert_feedback(
        &self,
        feedback: Feedback,
    ) -> Result<(), StoreError>;
}
