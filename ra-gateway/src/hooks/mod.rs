pub mod http;
pub mod llm;

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    cache::{CacheClient, CacheLookup, fingerprint},
    classify::FunctionName,
    dispatcher::UpstreamClient,
    error::hook::HookError,
    types::{
        hook::{Hook, HookLog, HookResult, HookType},
        log::CacheStatus,
    },
};

const HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// One hook round: which hooks to run against which bodies.
pub struct HookInvocation<'a> {
    pub function: FunctionName,
    pub request_body: &'a Value,
    pub response_body: Option<&'a Value>,
    pub force_hook_refresh: bool,
}

#[derive(Debug, Default)]
pub struct InputHookOutcome {
    pub logs: Vec<HookLog>,
    pub denied_by: Option<Uuid>,
    pub request_body_override: Option<Value>,
}

#[derive(Debug, Default)]
pub struct OutputHookOutcome {
    pub logs: Vec<HookLog>,
    pub response_body_override: Option<Value>,
}

/// Runs the request's hooks. Hooks execute concurrently; hook-log order
/// always matches input order. A hook failure never fails the request.
#[derive(Debug, Clone)]
pub struct HookExecutor {
    cache: CacheClient,
    client: UpstreamClient,
}

impl HookExecutor {
    #[must_use]
    pub fn new(cache: CacheClient, client: UpstreamClient) -> Self {
        Self { cache, client }
    }

    /// Input hooks gate the provider call: the first awaited hook returning
    /// `deny_request` short-circuits the pipeline; body overrides apply in
    /// input order.
    pub async fn run_input_hooks(
        &self,
        hooks: &[Hook],
        invocation: &HookInvocation<'_>,
    ) -> InputHookOutcome {
        let input_hooks: Vec<&Hook> = hooks
            .iter()
            .filter(|h| h.hook_type == HookType::Input)
            .collect();
        let logs = self.run_all(&input_hooks, invocation).await;

        let mut outcome = InputHookOutcome {
            logs,
            ..Default::default()
        };
        for (hook, log) in input_hooks.iter().zip(&outcome.logs) {
            if !hook.await_result {
                continue;
            }
            if log.result.deny_request && outcome.denied_by.is_none() {
                outcome.denied_by = Some(hook.id);
            }
            if let Some(body) = &log.result.request_body_override {
                outcome.request_body_override = Some(body.clone());
            }
        }
        outcome
    }

    /// Output hooks run only for 200 responses with a collected body; the
    /// caller enforces that precondition. Embed functions never reach here.
    pub async fn run_output_hooks(
        &self,
        hooks: &[Hook],
        invocation: &HookInvocation<'_>,
    ) -> OutputHookOutcome {
        let output_hooks: Vec<&Hook> = hooks
            .iter()
            .filter(|h| h.hook_type == HookType::Output)
            .collect();
        let logs = self.run_all(&output_hooks, invocation).await;

        let mut outcome = OutputHookOutcome {
            logs,
            ..Default::default()
        };
        for (hook, log) in output_hooks.iter().zip(&outcome.logs) {
            if !hook.await_result {
                continue;
            }
            if let Some(body) = &log.result.response_body_override {
                outcome.response_body_override = Some(body.clone());
            }
        }
        outcome
    }

    async fn run_all(
        &self,
        hooks: &[&Hook],
        invocation: &HookInvocation<'_>,
    ) -> Vec<HookLog> {
        // join_all preserves input order regardless of completion order
        join_all(
            hooks
                .iter()
                .map(|hook| self.run_hook(hook, invocation)),
        )
        .await
    }

    async fn run_hook(
        &self,
        hook: &Hook,
        invocation: &HookInvocation<'_>,
    ) -> HookLog {
        let start_time = Utc::now();
        let mut cache_status = CacheStatus::Disabled;
        let mut metadata = None;

        let key = hook.cache_mode.is_enabled().then(|| {
            fingerprint::hook_fingerprint(
                invocation.function,
                hook,
                invocation.request_body,
                invocation.response_body,
            )
        });

        let cached = match &key {
            Some(key) if !invocation.force_hook_refresh => {
                match self.cache.get(key).await {
                    CacheLookup::Hit { value, .. } => {
                        serde_json::from_str::<HookResult>(&value).ok()
                    }
                    _ => None,
                }
            }
            Some(_) => {
                cache_status = CacheStatus::Refresh;
                None
            }
            None => None,
        };

        let result = if let Some(result) = cached {
            cache_status = CacheStatus::Hit;
            result
        } else {
            if hook.cache_mode.is_enabled()
                && cache_status != CacheStatus::Refresh
            {
                cache_status = CacheStatus::Miss;
            }
            match self.invoke(hook, invocation).await {
                Ok(result) => {
                    if let Some(key) = key
                        && let Ok(serialized) =
                            serde_json::to_string(&result)
                    {
                        self.cache.put(key, serialized).await;
                    }
                    result
                }
                Err(error) => {
                    tracing::warn!(
                        hook_id = %hook.id,
                        error = %error,
                        "hook failed, continuing without it"
                    );
                    metadata = Some(
                        json!({"hookProviderError": error.to_string()})
                            .as_object()
                            .cloned()
                            .expect("literal object"),
                    );
                    HookResult::default()
                }
            }
        };

        let end_time = Utc::now();
        HookLog {
            hook_id: hook.id,
            hook_type: hook.hook_type,
            hook_provider: hook.hook_provider,
            start_time,
            end_time,
            duration: (end_time - start_time).num_milliseconds(),
            result,
            cache_status,
            metadata,
        }
    }

    async fn invoke(
        &self,
        hook: &Hook,
        invocation: &HookInvocation<'_>,
    ) -> Result<HookResult, HookError> {
        let call = async {
            match hook.hook_provider {
                crate::types::hook::HookProviderKind::Http => {
                    http::invoke(
                        self.client.http_client(),
                        hook,
                        invocation.function,
                        invocation.request_body,
                        invocation.response_body,
                    )
                    .await
                }
                crate::types::hook::HookProviderKind::Llm => {
                    llm::invoke(
                        &self.client,
                        hook,
                        invocation.function,
                        invocation.request_body,
                        invocation.response_body,
                    )
                    .await
                }
            }
        };
        tokio::time::timeout(HOOK_TIMEOUT, call)
            .await
            .map_err(|_| HookError::Timeout)?
    }
}
