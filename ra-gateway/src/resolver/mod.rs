pub mod template;

use std::sync::Arc;

use crate::{
    crypto::KeyEncryptor,
    error::{api::ApiError, invalid_req::InvalidRequestError},
    mapper::providers,
    store::UserDataStorageConnector,
    types::{
        agent::Skill,
        config::{
            RequestConfigPreProcessed, RequestTargetPreProcessed,
            ResolvedTarget,
        },
    },
};

/// Turns a pre-processed request target into a dispatchable one.
///
/// Side-effect free except for storage reads; all failures map to 422
/// except decryption failures, which are internal.
#[derive(Debug, Clone)]
pub struct Resolver {
    store: Arc<dyn UserDataStorageConnector>,
    encryptor: KeyEncryptor,
}

impl Resolver {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserDataStorageConnector>,
        encryptor: KeyEncryptor,
    ) -> Self {
        Self { store, encryptor }
    }

    /// Resolves the first target of the request config. Remaining targets
    /// are ignored; selection across multiple targets is a future
    /// extension.
    pub async fn resolve_first(
        &self,
        skill: &Skill,
        config: &RequestConfigPreProcessed,
    ) -> Result<ResolvedTarget, ApiError> {
        let Some(target) = config.targets.first() else {
            return Err(InvalidRequestError::NoTargets.into());
        };
        if config.targets.len() > 1 {
            tracing::debug!(
                ignored = config.targets.len() - 1,
                "using first target, ignoring the rest"
            );
        }
        self.resolve(skill, target).await
    }

    pub async fn resolve(
        &self,
        skill: &Skill,
        target: &RequestTargetPreProcessed,
    ) -> Result<ResolvedTarget, ApiError> {
        if !target.is_well_formed() {
            return Err(InvalidRequestError::AmbiguousTarget.into());
        }

        let mut resolved = if let Some(configuration_name) =
            &target.configuration_name
        {
            self.resolve_named(skill, target, configuration_name).await?
        } else {
            self.resolve_direct(target)?
        };

        // explicit api_key in the request always wins over the stored one
        if let Some(api_key) = &target.api_key {
            resolved.api_key = Some(api_key.clone());
        }

        let adapter = providers::adapter_for(&resolved.provider);
        if adapter.api_key_required
            && resolved
                .api_key
                .as_ref()
                .is_none_or(|key| key.expose().is_empty())
        {
            return Err(InvalidRequestError::MissingApiKey(
                resolved.provider.clone(),
            )
            .into());
        }

        Ok(resolved)
    }

    async fn resolve_named(
        &self,
        skill: &Skill,
        target: &RequestTargetPreProcessed,
        configuration_name: &str,
    ) -> Result<ResolvedTarget, ApiError> {
        let configuration = self
            .store
            .get_skill_configuration(skill.id, configuration_name)
            .await
            .map_err(crate::error::internal::InternalError::Store)?
            .ok_or_else(|| {
                InvalidRequestError::ConfigurationNotFound(
                    configuration_name.to_string(),
                )
            })?;

        let version_key = target.configuration_version.as_deref();
        let version = configuration.version(version_key).ok_or_else(|| {
            InvalidRequestError::ConfigurationVersionNotFound {
                name: configuration_name.to_string(),
                version: version_key
                    .unwrap_or(crate::types::agent::CURRENT_VERSION_KEY)
                    .to_string(),
            }
        })?;

        let mut params = version.params.clone();
        if let Some(system_prompt) = &params.system_prompt {
            params.system_prompt = Some(template::render(
                system_prompt,
                target.system_prompt_variables.as_ref(),
            ));
        }

        let model_id = params
            .model_id
            .ok_or(InvalidRequestError::MissingModel)?;
        let model = self
            .store
            .get_model(model_id)
            .await
            .map_err(crate::error::internal::InternalError::Store)?
            .ok_or(InvalidRequestError::ModelNotFound(model_id))?;

        let stored_key = self
            .store
            .get_provider_api_key(model.ai_provider_api_key_id)
            .await
            .map_err(crate::error::internal::InternalError::Store)?
            .ok_or(InvalidRequestError::ApiKeyNotFound(
                model.ai_provider_api_key_id,
            ))?;

        let adapter = providers::adapter_for(&stored_key.ai_provider);
        adapter.validate_custom_fields(&stored_key.custom_fields)?;

        let api_key = self.encryptor.decrypt(&stored_key.api_key)?;

        // provider-specific extras on the stored key can stand in for a
        // per-request custom_host (Workers AI account ids)
        let custom_host = target.custom_host.clone().or_else(|| {
            stored_key
                .custom_fields
                .get("account_id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });

        Ok(ResolvedTarget {
            provider: stored_key.ai_provider,
            model: Some(model.model_name),
            api_key: Some(api_key.into()),
            params,
            custom_host,
            azure_ai_foundry_url: target.azure_ai_foundry_url.clone(),
            weight: target.weight.unwrap_or(1.0),
            cache: target.cache,
            retry: target.retry.clone(),
        })
    }

    fn resolve_direct(
        &self,
        target: &RequestTargetPreProcessed,
    ) -> Result<ResolvedTarget, ApiError> {
        let Some(provider) = target.provider.clone() else {
            return Err(InvalidRequestError::AmbiguousTarget.into());
        };
        if target.model.is_none() {
            return Err(InvalidRequestError::MissingModel.into());
        }
        Ok(ResolvedTarget {
            provider,
            model: target.model.clone(),
            api_key: None,
            params: Default::default(),
            custom_host: target.custom_host.clone(),
            azure_ai_foundry_url: target.azure_ai_foundry_url.clone(),
            weight: target.weight.unwrap_or(1.0),
            cache: target.cache,
            retry: target.retry.clone(),
        })
    }
}
