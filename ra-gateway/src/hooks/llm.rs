use std::str::FromStr;

use bytes::Bytes;
use http::Method;
use serde_json::{Value, json};

use crate::{
    classify::FunctionName,
    dispatcher::{UpstreamClient, UpstreamRequest},
    error::hook::HookError,
    mapper::{self, TransformContext, providers},
    types::{
        config::ResolvedTarget, hook::Hook, hook::HookResult,
        provider::InferenceProvider,
    },
};

const SYSTEM_PROMPT: &str = "You are a request guard for an LLM gateway. \
     Inspect the JSON document in the user message and reply with a single \
     JSON object of the shape {\"deny_request\": bool, \"skipped\": false}. \
     Reply with JSON only.";

/// Invokes an LLM hook: a nested gateway dispatch against the hook's
/// designated model, whose reply must parse as a `HookResult`.
pub async fn invoke(
    client: &UpstreamClient,
    hook: &Hook,
    function: FunctionName,
    request_body: &Value,
    response_body: Option<&Value>,
) -> Result<HookResult, HookError> {
    let provider = hook
        .config
        .get("provider")
        .and_then(Value::as_str)
        .ok_or(HookError::MissingConfig("provider"))?;
    let model = hook
        .config
        .get("model")
        .and_then(Value::as_str)
        .ok_or(HookError::MissingConfig("model"))?;
    let api_key = hook
        .config
        .get("api_key")
        .and_then(Value::as_str)
        .ok_or(HookError::MissingConfig("api_key"))?;
    let provider = InferenceProvider::from_str(provider)
        .expect("provider parsing is infallible");

    let target = ResolvedTarget {
        provider: provider.clone(),
        model: Some(model.to_string()),
        api_key: Some(api_key.to_string().into()),
        params: Default::default(),
        custom_host: hook
            .config
            .get("custom_host")
            .and_then(Value::as_str)
            .map(str::to_string),
        azure_ai_foundry_url: None,
        weight: 1.0,
        cache: None,
        retry: None,
    };

    let document = json!({
        "function_name": function.as_ref(),
        "request_body": request_body,
        "response_body": response_body,
    });
    let canonical = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": document.to_string()},
        ],
    });

    let adapter = providers::adapter_for(&provider);
    let support = adapter
        .support(FunctionName::ChatComplete)
        .ok_or_else(|| {
            HookError::Llm(format!(
                "provider {provider} does not support chat completions"
            ))
        })?;
    let body = canonical
        .as_object()
        .cloned()
        .expect("canonical hook body is an object");
    let mapped = mapper::build_provider_body(adapter, support, &body, model)
        .map_err(|e| HookError::Llm(e.to_string()))?;

    let base_url = adapter
        .resolve_base_url(&target)
        .map_err(|e| HookError::Llm(e.to_string()))?;
    let endpoint = adapter
        .endpoint(FunctionName::ChatComplete, model)
        .expect("support checked above");
    let url = join_url(&base_url, &endpoint)
        .map_err(|e| HookError::Llm(e.to_string()))?;
    let mut headers = adapter
        .headers(&target)
        .map_err(|e| HookError::Llm(e.to_string()))?;
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );

    let request = UpstreamRequest {
        provider: &provider,
        method: Method::POST,
        url,
        headers,
        body: Some(Bytes::from(
            serde_json::to_vec(&mapped).map_err(HookError::InvalidResult)?,
        )),
        retry: None,
    };

    let response = client
        .dispatch_sync(&request)
        .await
        .map_err(|e| HookError::Llm(e.to_string()))?;
    if response.status.is_client_error() || response.status.is_server_error()
    {
        return Err(HookError::Llm(format!(
            "hook LLM returned {}",
            response.status
        )));
    }

    let upstream: Value = serde_json::from_slice(&response.body)?;
    let ctx = TransformContext {
        provider: &provider,
        function: FunctionName::ChatComplete,
        model,
        strict_openai_compliance: true,
    };
    let canonical = mapper::transform_success(support, &ctx, upstream)
        .map_err(|e| HookError::Llm(e.to_string()))?;
    let content = canonical
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            HookError::Llm("hook LLM reply has no content".to_string())
        })?;
    let result = serde_json::from_str(content.trim())?;
    Ok(result)
}

fn join_url(base: &url::Url, endpoint: &str) -> Result<url::Url, String> {
    let joined = format!(
        "{}{}",
        base.as_str().trim_end_matches('/'),
        endpoint
    );
    url::Url::parse(&joined).map_err(|e| e.to_string())
}
