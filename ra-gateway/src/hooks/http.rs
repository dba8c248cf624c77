use serde_json::{Value, json};

use crate::{
    classify::FunctionName, error::hook::HookError, types::hook::Hook,
};

/// Invokes an HTTP hook: POSTs a JSON document describing the canonical
/// request (and response, for output hooks) to the hook's URL and expects a
/// `HookResult` back.
pub async fn invoke(
    client: &reqwest::Client,
    hook: &Hook,
    function: FunctionName,
    request_body: &Value,
    response_body: Option<&Value>,
) -> Result<crate::types::hook::HookResult, HookError> {
    let url = hook
        .config
        .get("url")
        .and_then(Value::as_str)
        .ok_or(HookError::MissingConfig("url"))?;

    let document = json!({
        "hook_id": hook.id,
        "type": hook.hook_type,
        "function_name": function.as_ref(),
        "request_body": request_body,
        "response_body": response_body,
    });

    let response = client.post(url).json(&document).send().await?;
    let body = response.error_for_status()?.bytes().await?;
    let result = serde_json::from_slice(&body)?;
    Ok(result)
}
