use serde_json::{Value, json};

use crate::{
    classify::FunctionName, mapper::descriptor::JsonMap,
    types::config::ResolvedTarget,
};

fn fill_absent(body: &mut JsonMap, key: &str, value: Option<Value>) {
    if let Some(value) = value
        && !body.contains_key(key)
    {
        body.insert(key.to_string(), value);
    }
}

/// Merges the resolved configuration into the canonical body before
/// mapping. The configuration's model always wins (selecting it is the
/// point of the config); sampling parameters only fill gaps the client
/// left.
pub fn apply(
    body: &mut JsonMap,
    target: &ResolvedTarget,
    function: FunctionName,
) {
    if let Some(model) = &target.model {
        body.insert("model".to_string(), json!(model));
    }

    let params = &target.params;
    fill_absent(body, "temperature", params.temperature.map(Value::from));
    fill_absent(body, "top_p", params.top_p.map(Value::from));
    fill_absent(body, "max_tokens", params.max_tokens.map(Value::from));
    fill_absent(
        body,
        "frequency_penalty",
        params.frequency_penalty.map(Value::from),
    );
    fill_absent(
        body,
        "presence_penalty",
        params.presence_penalty.map(Value::from),
    );
    fill_absent(body, "seed", params.seed.map(Value::from));
    fill_absent(
        body,
        "stop",
        params.stop.as_ref().map(|stop| json!(stop)),
    );

    if function.carries_tools()
        && let Some(system_prompt) = &params.system_prompt
        && let Some(Value::Array(messages)) = body.get_mut("messages")
    {
        let has_system = messages.iter().any(|m| {
            matches!(
                m.get("role").and_then(Value::as_str),
                Some("system" | "developer")
            )
        });
        if !has_system {
            messages.insert(
                0,
                json!({"role": "system", "content": system_prompt}),
            );
        }
    }

    if let Some(additional) = &params.additional_params {
        for (key, value) in additional {
            fill_absent(body, key, Some(value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        agent::ConfigurationParams, provider::InferenceProvider,
    };

    fn target(params: ConfigurationParams) -> ResolvedTarget {
        ResolvedTarget {
            provider: InferenceProvider::OpenAI,
            model: Some("gpt-4o-mini".to_string()),
            api_key: None,
            params,
            custom_host: None,
            azure_ai_foundry_url: None,
            weight: 1.0,
            cache: None,
            retry: None,
        }
    }

    #[test]
    fn configured_model_wins_and_params_fill_gaps() {
        let mut body = serde_json::json!({
            "model": "client-model",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.9,
        })
        .as_object()
        .cloned()
        .unwrap();
        let target = target(ConfigurationParams {
            temperature: Some(0.2),
            max_tokens: Some(128),
            ..Default::default()
        });
        apply(&mut body, &target, FunctionName::ChatComplete);
        assert_eq!(body["model"], json!("gpt-4o-mini"));
        // client's explicit temperature survives
        assert_eq!(body["temperature"], json!(0.9));
        assert_eq!(body["max_tokens"], json!(128));
    }

    #[test]
    fn system_prompt_is_prepended_once() {
        let mut body = serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hi"}],
        })
        .as_object()
        .cloned()
        .unwrap();
        let target = target(ConfigurationParams {
            system_prompt: Some("Be helpful.".to_string()),
            ..Default::default()
        });
        apply(&mut body, &target, FunctionName::ChatComplete);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], json!("system"));
        assert_eq!(messages[0]["content"], json!("Be helpful."));

        // a client-supplied system message is never displaced
        let mut body = serde_json::json!({
            "model": "m",
            "messages": [
                {"role": "system", "content": "client prompt"},
                {"role": "user", "content": "hi"}
            ],
        })
        .as_object()
        .cloned()
        .unwrap();
        apply(&mut body, &target, FunctionName::ChatComplete);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], json!("client prompt"));
    }
}
