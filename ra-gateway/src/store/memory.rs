use async_trait::async_trait;
use rustc_hash::FxHashMap as HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserDataStorageConnector};
use crate::types::{
    agent::{Agent, Skill, SkillConfiguration, Tool},
    log::{EvaluationRun, Feedback, Log},
    model::{AIProviderAPIKey, Model},
};

/// The default store: everything lives in process memory behind RwLocks.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    agents: RwLock<HashMap<Uuid, Agent>>,
    skills: RwLock<HashMap<Uuid, Skill>>,
    configurations: RwLock<HashMap<Uuid, SkillConfiguration>>,
    models: RwLock<HashMap<Uuid, Model>>,
    api_keys: RwLock<HashMap<Uuid, AIProviderAPIKey>>,
    tools: RwLock<HashMap<Uuid, Tool>>,
    logs: RwLock<Vec<Log>>,
    evaluation_runs: RwLock<Vec<EvaluationRun>>,
    feedback: RwLock<Vec<Feedback>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDataStorageConnector for InMemoryStore {
    async fn create_agent(&self, agent: Agent) -> Result<Agent, StoreError> {
        let mut agents = self.agents.write().await;
        if agents.values().any(|a| a.name == agent.name) {
            return Err(StoreError::DuplicateName(agent.name));
        }
        agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn get_agent_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Agent>, StoreError> {
        let agents = self.agents.read().await;
        Ok(agents.values().find(|a| a.name == name).cloned())
    }

    async fn delete_agent(&self, id: Uuid) -> Result<(), StoreError> {
        self.agents.write().await.remove(&id);
        let skill_ids: Vec<Uuid> = {
            let mut skills = self.skills.write().await;
            let ids = skills
                .values()
                .filter(|s| s.agent_id == id)
                .map(|s| s.id)
                .collect::<Vec<_>>();
            skills.retain(|_, s| s.agent_id != id);
            ids
        };
        self.configurations
            .write()
            .await
            .retain(|_, c| !skill_ids.contains(&c.skill_id));
        self.tools.write().await.retain(|_, t| t.agent_id != id);
        self.logs.write().await.retain(|l| l.agent_id != id);
        Ok(())
    }

    async fn create_skill(&self, skill: Skill) -> Result<Skill, StoreError> {
        let mut skills = self.skills.write().await;
        if skills
            .values()
            .any(|s| s.agent_id == skill.agent_id && s.name == skill.name)
        {
            return Err(StoreError::DuplicateName(skill.name));
        }
        skills.insert(skill.id, skill.clone());
        Ok(skill)
    }

    async fn get_skill(
        &self,
        agent_id: Uuid,
        name: &str,
    ) -> Result<Option<Skill>, StoreError> {
        let skills = self.skills.read().await;
        Ok(skills
            .values()
            .find(|s| s.agent_id == agent_id && s.name == name)
            .cloned())
    }

    async fn create_skill_configuration(
        &self,
        configuration: SkillConfiguration,
    ) -> Result<SkillConfiguration, StoreError> {
        let mut configurations = self.configurations.write().await;
        if configurations.values().any(|c| {
            c.skill_id == configuration.skill_id
                && c.name == configuration.name
        }) {
            return Err(StoreError::DuplicateName(configuration.name));
        }
        configurations.insert(configuration.id, configuration.clone());
        Ok(configuration)
    }

    async fn get_skill_configuration(
        &self,
        skill_id: Uuid,
        name: &str,
    ) -> Result<Option<SkillConfiguration>, StoreError> {
        let configurations = self.configurations.read().await;
        Ok(configurations
            .values()
            .find(|c| c.skill_id == skill_id && c.name == name)
            .cloned())
    }

    async fn create_model(&self, model: Model) -> Result<Model, StoreError> {
        self.models.write().await.insert(model.id, model.clone());
        Ok(model)
    }

    async fn get_model(&self, id: Uuid) -> Result<Option<Model>, StoreError> {
        Ok(self.models.read().await.get(&id).cloned())
    }

    async fn create_provider_api_key(
        &self,
        key: AIProviderAPIKey,
    ) -> Result<AIProviderAPIKey, StoreError> {
        self.api_keys.write().await.insert(key.id, key.clone());
        Ok(key)
    }

    async fn get_provider_api_key(
        &self,
        id: Uuid,
    ) -> Result<Option<AIProviderAPIKey>, StoreError> {
        Ok(self.api_keys.read().await.get(&id).cloned())
    }

    async fn upsert_tool(&self, tool: Tool) -> Result<bool, StoreError> {
        let mut tools = self.tools.write().await;
        if tools
            .values()
            .any(|t| t.agent_id == tool.agent_id && t.hash == tool.hash)
        {
            return Ok(false);
        }
        tools.insert(tool.id, tool);
        Ok(true)
    }

    async fn list_tools(
        &self,
        agent_id: Uuid,
    ) -> Result<Vec<Tool>, StoreError> {
        let tools = self.tools.read().await;
        Ok(tools
            .values()
            .filter(|t| t.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn insert_log(&self, log: Log) -> Result<(), StoreError> {
        self.logs.write().await.push(log);
        Ok(())
    }

    async fn list_logs(
        &self,
        agent_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Log>, StoreError> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|l| agent_id.is_none_or(|id| l.agent_id == id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_evaluation_run(
        &self,
        run: EvaluationRun,
    ) -> Result<(), StoreError> {
        self.evaluation_runs.write().await.push(run);
        Ok(())
    }

    async fn insert_feedback(
        &self,
        feedback: Feedback,
    ) -> Result<(), StoreError> {
        self.feedback.write().await.push(feedback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn agent_names_are_unique() {
        let store = InMemoryStore::new();
        store.create_agent(Agent::new("support")).await.unwrap();
        let duplicate = store.create_agent(Agent::new("support")).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn skill_names_are_unique_per_agent() {
        let store = InMemoryStore::new();
        let agent_a = store.create_agent(Agent::new("a")).await.unwrap();
        let agent_b = store.create_agent(Agent::new("b")).await.unwrap();
        store
            .create_skill(Skill::new(agent_a.id, "answer"))
            .await
            .unwrap();
        // same name under a different agent is fine
        store
            .create_skill(Skill::new(agent_b.id, "answer"))
            .await
            .unwrap();
        let duplicate =
            store.create_skill(Skill::new(agent_a.id, "answer")).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn deleting_an_agent_cascades() {
        let store = InMemoryStore::new();
        let agent = store.create_agent(Agent::new("a")).await.unwrap();
        let skill = store
            .create_skill(Skill::new(agent.id, "s"))
            .await
            .unwrap();
        store.delete_agent(agent.id).await.unwrap();
        assert!(
            store
                .get_skill(agent.id, &skill.name)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn tools_are_recorded_once_per_hash() {
        let store = InMemoryStore::new();
        let agent = store.create_agent(Agent::new("a")).await.unwrap();
        let tool = Tool {
            id: Uuid::now_v7(),
            agent_id: agent.id,
            name: "calculate".to_string(),
            hash: "abc".to_string(),
            definition: serde_json::json!({}),
            created_at: chrono::Utc::now(),
        };
        assert!(store.upsert_tool(tool.clone()).await.unwrap());
        let again = Tool {
            id: Uuid::now_v7(),
            ..tool
        };
        assert!(!store.upsert_tool(again).await.unwrap());
        assert_eq!(store.list_tools(agent.id).await.unwrap().len(), 1);
    }
}
