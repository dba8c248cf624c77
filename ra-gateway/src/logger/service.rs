use chrono::{DateTime, Utc};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::LogSink;
use crate::{
    classify::FunctionName,
    types::{
        extensions::SharedRequestContext,
        hook::HookLog,
        log::{CacheStatus, Log, ProviderRequestLog},
    },
};

/// Assembles the per-dispatch [`Log`] record and hands it to the sink.
///
/// Spawned fire-and-forget for streaming responses; awaited inline nowhere.
#[derive(TypedBuilder)]
pub struct LoggerService {
    sink: LogSink,
    ctx: SharedRequestContext,
    method: String,
    endpoint: String,
    function: FunctionName,
    status: u16,
    start_time: DateTime<Utc>,
    provider_log: ProviderRequestLog,
    #[builder(default)]
    hook_logs: Vec<HookLog>,
    #[builder(default)]
    cache_status: CacheStatus,
    #[builder(default)]
    outcome: Option<String>,
    #[builder(default)]
    model: Option<String>,
}

impl LoggerService {
    pub async fn log(self) {
        let end_time = Utc::now();
        let config = &self.ctx.config;
        let base_config = serde_json::to_value(config).ok();
        let log = Log {
            id: Uuid::now_v7(),
            agent_id: self.ctx.agent.id,
            skill_id: self.ctx.skill.id,
            method: self.method,
            endpoint: self.endpoint,
            function_name: self.function.as_ref().to_string(),
            status: self.status,
            outcome: self.outcome,
            start_time: self.start_time,
            end_time,
            duration: (end_time - self.start_time).num_milliseconds(),
            base_config,
            ai_provider: self.ctx.target.provider.clone(),
            model: self
                .model
                .or_else(|| self.ctx.target.model.clone()),
            ai_provider_request_log: self.provider_log,
            hook_logs: self.hook_logs,
            metadata: None,
            cache_status: self.cache_status,
            trace_id: config.trace_id.clone(),
            parent_span_id: config.parent_span_id.clone(),
            span_id: Some(Uuid::now_v7().to_string()),
            span_name: config.span_name.clone(),
            app_id: config.app_id.clone(),
            external_user_id: config.external_user_id.clone(),
            user_metadata: config.user_metadata.clone(),
        };
        self.sink.emit(log).await;
    }
}
