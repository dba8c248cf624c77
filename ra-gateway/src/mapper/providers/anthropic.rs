use chrono::Utc;
use serde_json::{Value, json};

use super::{
    AuthStyle, BaseUrl, FunctionSupport, ProviderAdapter, RequestMap,
    ResponseTransform,
};
use crate::{
    classify::FunctionName::{ChatComplete, StreamChatComplete},
    error::mapper::MapperError,
    mapper::{
        TransformContext,
        capability::{CapabilityRule, ParamAction},
        descriptor::{FieldMap, JsonMap, ParamDescriptor},
        stream::{StreamState, stamp_provider},
    },
};

/// OpenAI temperatures range 0..2, Anthropic's 0..1.
static CAPABILITIES: &[CapabilityRule] = &[CapabilityRule::new(
    &["claude-"],
    "temperature",
    ParamAction::Scale {
        factor: 0.5,
        max: 1.0,
    },
)];

fn content_text(message: &Value) -> String {
    match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn messages(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    let Some(messages) = body.get("messages").and_then(Value::as_array)
    else {
        return Ok(None);
    };
    let mut out = Vec::new();
    for message in messages {
        let role =
            message.get("role").and_then(Value::as_str).unwrap_or("user");
        match role {
            // system turns move to the top-level `system` parameter
            "system" | "developer" => {}
            "tool" => {
                out.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": message
                            .get("tool_call_id")
                            .cloned()
                            .unwrap_or(Value::Null),
                        "content": content_text(message),
                    }],
                }));
            }
            "assistant" => {
                let mut blocks = Vec::new();
                let text = content_text(message);
                if !text.is_empty() {
                    blocks.push(json!({"type": "text", "text": text}));
                }
                if let Some(tool_calls) =
                    message.get("tool_calls").and_then(Value::as_array)
                {
                    for call in tool_calls {
                        let input = call
                            .pointer("/function/arguments")
                            .and_then(Value::as_str)
                            .and_then(|raw| {
                                serde_json::from_str::<Value>(raw).ok()
                            })
                            .unwrap_or_else(|| json!({}));
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.get("id").cloned()
                                .unwrap_or(Value::Null),
                            "name": call.pointer("/function/name").cloned()
                                .unwrap_or(Value::Null),
                            "input": input,
                        }));
                    }
                }
                out.push(json!({"role": "assistant", "content": blocks}));
            }
            _ => {
                // vision and other content parts pass through untouched
                out.push(json!({
                    "role": "user",
                    "content": message
                        .get("content")
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new())),
                }));
            }
        }
    }
    Ok(Some(Value::Array(out)))
}

fn system_prompt(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    let Some(messages) = body.get("messages").and_then(Value::as_array)
    else {
        return Ok(None);
    };
    let system: Vec<String> = messages
        .iter()
        .filter(|m| {
            matches!(
                m.get("role").and_then(Value::as_str),
                Some("system" | "developer")
            )
        })
        .map(content_text)
        .collect();
    if system.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::String(system.join("\n\n"))))
    }
}

fn max_tokens(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(body
        .get("max_tokens")
        .or_else(|| body.get("max_completion_tokens"))
        .cloned())
}

fn default_max_tokens() -> Value {
    json!(4096)
}

fn stop_sequences(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(match body.get("stop") {
        Some(Value::String(s)) => Some(json!([s])),
        Some(value @ Value::Array(_)) => Some(value.clone()),
        _ => None,
    })
}

fn tools(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    let Some(tools) = body.get("tools").and_then(Value::as_array) else {
        return Ok(None);
    };
    let mapped: Vec<Value> = tools
        .iter()
        .filter_map(|tool| {
            let function = tool.get("function")?;
            Some(json!({
                "name": function.get("name")?,
                "description": function
                    .get("description")
                    .cloned()
                    .unwrap_or(Value::Null),
                "input_schema": function
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| json!({"type": "object"})),
            }))
        })
        .collect();
    Ok(Some(Value::Array(mapped)))
}

fn tool_choice(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(match body.get("tool_choice") {
        Some(Value::String(choice)) => match choice.as_str() {
            "auto" => Some(json!({"type": "auto"})),
            "required" => Some(json!({"type": "any"})),
            _ => None,
        },
        Some(Value::Object(choice)) => choice
            .get("function")
            .and_then(|f| f.get("name"))
            .map(|name| json!({"type": "tool", "name": name})),
        _ => None,
    })
}

fn metadata(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(body
        .get("user")
        .and_then(Value::as_str)
        .map(|user| json!({"user_id": user})))
}

static CHAT_MAPS: &[FieldMap] = &[
    FieldMap::new("model", &[ParamDescriptor::required("model")]),
    FieldMap::new(
        "messages",
        &[ParamDescriptor::required_transform("messages", messages)],
    ),
    FieldMap::new(
        "messages",
        &[ParamDescriptor::with_transform("system", system_prompt)],
    ),
    FieldMap::new(
        "max_tokens",
        &[ParamDescriptor::required_with(
            "max_tokens",
            max_tokens,
            default_max_tokens,
        )],
    ),
    FieldMap::new("temperature", &[ParamDescriptor::copy("temperature")]),
    FieldMap::new("top_p", &[ParamDescriptor::copy("top_p")]),
    FieldMap::new(
        "stop",
        &[ParamDescriptor::with_transform(
            "stop_sequences",
            stop_sequences,
        )],
    ),
    FieldMap::new("stream", &[ParamDescriptor::copy("stream")]),
    FieldMap::new("tools", &[ParamDescriptor::with_transform("tools", tools)]),
    FieldMap::new(
        "tool_choice",
        &[ParamDescriptor::with_transform("tool_choice", tool_choice)],
    ),
    FieldMap::new(
        "user",
        &[ParamDescriptor::with_transform("metadata", metadata)],
    ),
];

fn map_stop_reason(stop_reason: Option<&str>) -> &'static str {
    match stop_reason {
        Some("max_tokens") => "length",
        Some("tool_use") => "tool_calls",
        _ => "stop",
    }
}

/// Translates an Anthropic messages response into the canonical chat
/// completion shape.
fn chat_response(
    body: Value,
    ctx: &TransformContext<'_>,
) -> Result<Value, MapperError> {
    let content = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MapperError::TransformFailed(
                "anthropic response has no content array".to_string(),
            )
        })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in content {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(t) = block.get("text").and_then(Value::as_str) {
                    text.push_str(t);
                }
            }
            Some("tool_use") => {
                let arguments = block
                    .get("input")
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "{}".to_string());
                tool_calls.push(json!({
                    "id": block.get("id").cloned().unwrap_or(Value::Null),
                    "type": "function",
                    "function": {
                        "name": block.get("name").cloned()
                            .unwrap_or(Value::Null),
                        "arguments": arguments,
                    },
                }));
            }
            _ => {}
        }
    }

    let mut message = json!({"role": "assistant", "content": text});
    if !tool_calls.is_empty() {
        message["tool_calls"] = Value::Array(tool_calls);
    }

    let stop_reason = body.get("stop_reason").and_then(Value::as_str);
    let usage = body.get("usage");
    let prompt_tokens = usage
        .and_then(|u| u.get("input_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let completion_tokens = usage
        .and_then(|u| u.get("output_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Ok(json!({
        "id": body.get("id").cloned().unwrap_or(Value::Null),
        "object": "chat.completion",
        "created": Utc::now().timestamp(),
        "model": body
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(ctx.model),
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": map_stop_reason(stop_reason),
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens,
        },
    }))
}

fn chunk_envelope(state: &StreamState, ctx: &TransformContext<'_>) -> Value {
    json!({
        "id": state.id.clone().unwrap_or_default(),
        "object": "chat.completion.chunk",
        "created": state.created.unwrap_or_else(|| Utc::now().timestamp()),
        "model": state.model.clone().unwrap_or_else(|| ctx.model.to_string()),
        "choices": [{"index": 0, "delta": {}, "finish_reason": Value::Null}],
    })
}

/// Translates one Anthropic SSE event into zero or more canonical chunks.
fn chat_chunk(
    payload: &str,
    state: &mut StreamState,
    ctx: &TransformContext<'_>,
) -> Result<Vec<Value>, MapperError> {
    let event: Value = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(error) => {
            tracing::warn!(error = %error, "skipping unparseable SSE chunk");
            return Ok(Vec::new());
        }
    };

    let mut chunks = Vec::new();
    match event.get("type").and_then(Value::as_str) {
        Some("message_start") => {
            let message = event.get("message").cloned().unwrap_or_default();
            state.id = message
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);
            state.model = message
                .get("model")
                .and_then(Value::as_str)
                .map(str::to_string);
            state.created = Some(Utc::now().timestamp());
            let mut chunk = chunk_envelope(state, ctx);
            chunk["choices"][0]["delta"] = json!({"role": "assistant"});
            chunks.push(chunk);
        }
        Some("content_block_start") => {
            let block_index =
                event.get("index").and_then(Value::as_u64).unwrap_or(0);
            if let Some(block) = event.get("content_block")
                && block.get("type").and_then(Value::as_str)
                    == Some("tool_use")
            {
                let tool_index = state.tool_index(block_index);
                let mut chunk = chunk_envelope(state, ctx);
                chunk["choices"][0]["delta"] = json!({
                    "tool_calls": [{
                        "index": tool_index,
                        "id": block.get("id").cloned()
                            .unwrap_or(Value::Null),
                        "type": "function",
                        "function": {
                            "name": block.get("name").cloned()
                                .unwrap_or(Value::Null),
                            "arguments": "",
                        },
                    }],
                });
                chunks.push(chunk);
            }
        }
        Some("content_block_delta") => {
            let block_index =
                event.get("index").and_then(Value::as_u64).unwrap_or(0);
            let delta = event.get("delta").cloned().unwrap_or_default();
            match delta.get("type").and_then(Value::as_str) {
                Some("text_delta") => {
                    let mut chunk = chunk_envelope(state, ctx);
                    chunk["choices"][0]["delta"] = json!({
                        "content": delta.get("text").cloned()
                            .unwrap_or(Value::Null),
                    });
                    chunks.push(chunk);
                }
                Some("input_json_delta") => {
                    let tool_index = state.tool_index(block_index);
                    let mut chunk = chunk_envelope(state, ctx);
                    chunk["choices"][0]["delta"] = json!({
                        "tool_calls": [{
                            "index": tool_index,
                            "function": {
                                "arguments": delta.get("partial_json")
                                    .cloned().unwrap_or(Value::Null),
                            },
                        }],
                    });
                    chunks.push(chunk);
                }
                _ => {}
            }
        }
        Some("message_delta") => {
            let stop_reason = event
                .pointer("/delta/stop_reason")
                .and_then(Value::as_str);
            let mut chunk = chunk_envelope(state, ctx);
            chunk["choices"][0]["finish_reason"] =
                json!(map_stop_reason(stop_reason));
            chunks.push(chunk);
        }
        // ping / message_stop carry nothing; the pipeline appends [DONE]
        _ => {}
    }

    for chunk in &mut chunks {
        stamp_provider(chunk, ctx.provider.as_ref());
    }
    Ok(chunks)
}

static FUNCTIONS: &[FunctionSupport] = &[
    FunctionSupport {
        function: ChatComplete,
        endpoint: "/v1/messages",
        form_data: false,
        request: RequestMap::Mapped(CHAT_MAPS),
        response: ResponseTransform::Full(chat_response),
    },
    FunctionSupport {
        function: StreamChatComplete,
        endpoint: "/v1/messages",
        form_data: false,
        request: RequestMap::Mapped(CHAT_MAPS),
        response: ResponseTransform::StreamChunk(chat_chunk),
    },
];

pub static ANTHROPIC: ProviderAdapter = ProviderAdapter {
    name: "anthropic",
    api_key_required: true,
    auth: AuthStyle::AnthropicApiKey,
    base_url: BaseUrl::Fixed("https://api.anthropic.com"),
    functions: FUNCTIONS,
    capabilities: CAPABILITIES,
    custom_fields: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::FunctionName, mapper::descriptor::apply_field_maps,
        types::provider::InferenceProvider,
    };

    fn ctx<'a>() -> TransformContext<'a> {
        TransformContext {
            provider: &InferenceProvider::Anthropic,
            function: FunctionName::ChatComplete,
            model: "claude-3-haiku-20240307",
            strict_openai_compliance: true,
        }
    }

    #[test]
    fn chat_request_maps_to_messages_body() {
        let body = serde_json::json!({
            "model": "claude-3-haiku-20240307",
            "messages": [
                {"role": "system", "content": "Be terse."},
                {"role": "user", "content": "Hi"}
            ],
            "max_tokens": 256,
            "stop": "END",
            "unrelated_field": true,
        });
        let mapped =
            apply_field_maps(CHAT_MAPS, body.as_object().unwrap()).unwrap();
        assert_eq!(mapped["model"], json!("claude-3-haiku-20240307"));
        assert_eq!(mapped["system"], json!("Be terse."));
        assert_eq!(mapped["max_tokens"], json!(256));
        assert_eq!(mapped["stop_sequences"], json!(["END"]));
        assert_eq!(
            mapped["messages"],
            json!([{"role": "user", "content": "Hi"}])
        );
        assert!(!mapped.contains_key("unrelated_field"));
    }

    #[test]
    fn max_tokens_defaults_when_absent() {
        let body = serde_json::json!({
            "model": "claude-3-haiku-20240307",
            "messages": [{"role": "user", "content": "Hi"}],
        });
        let mapped =
            apply_field_maps(CHAT_MAPS, body.as_object().unwrap()).unwrap();
        assert_eq!(mapped["max_tokens"], json!(4096));
    }

    #[test]
    fn tools_map_to_input_schema() {
        let body = serde_json::json!({
            "model": "claude-3-haiku-20240307",
            "messages": [{"role": "user", "content": "2+2"}],
            "tools": [{
                "type": "function",
                "function": {
                    "name": "calculate",
                    "parameters": {"type": "object"}
                }
            }],
            "tool_choice": "auto",
        });
        let mapped =
            apply_field_maps(CHAT_MAPS, body.as_object().unwrap()).unwrap();
        assert_eq!(mapped["tools"][0]["name"], json!("calculate"));
        assert_eq!(
            mapped["tools"][0]["input_schema"],
            json!({"type": "object"})
        );
        assert_eq!(mapped["tool_choice"], json!({"type": "auto"}));
    }

    #[test]
    fn response_translates_text_and_tool_use() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "model": "claude-3-haiku-20240307",
            "content": [
                {"type": "text", "text": "Using the calculator."},
                {"type": "tool_use", "id": "toolu_1", "name": "calculate",
                 "input": {"a": 2, "b": 2}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5},
        });
        let canonical = chat_response(body, &ctx()).unwrap();
        assert_eq!(canonical["object"], json!("chat.completion"));
        let message = &canonical["choices"][0]["message"];
        assert_eq!(message["content"], json!("Using the calculator."));
        assert_eq!(
            message["tool_calls"][0]["function"]["name"],
            json!("calculate")
        );
        assert_eq!(
            canonical["choices"][0]["finish_reason"],
            json!("tool_calls")
        );
        assert_eq!(canonical["usage"]["total_tokens"], json!(15));
    }

    #[test]
    fn missing_content_is_a_shape_error() {
        let body = json!({"id": "msg_1", "model": "m"});
        assert!(chat_response(body, &ctx()).is_err());
    }

    #[test]
    fn stream_events_translate_to_chunks() {
        let mut state = StreamState::default();
        let ctx = ctx();

        let start = chat_chunk(
            &json!({
                "type": "message_start",
                "message": {"id": "msg_1",
                            "model": "claude-3-haiku-20240307"}
            })
            .to_string(),
            &mut state,
            &ctx,
        )
        .unwrap();
        assert_eq!(start[0]["choices"][0]["delta"]["role"], json!("assistant"));

        let delta = chat_chunk(
            &json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": "Hello"}
            })
            .to_string(),
            &mut state,
            &ctx,
        )
        .unwrap();
        assert_eq!(delta[0]["choices"][0]["delta"]["content"], json!("Hello"));
        assert_eq!(delta[0]["id"], json!("msg_1"));
        assert_eq!(delta[0]["provider"], json!("anthropic"));

        let finish = chat_chunk(
            &json!({
                "type": "message_delta",
                "delta": {"stop_reason": "end_turn"},
                "usage": {"output_tokens": 3}
            })
            .to_string(),
            &mut state,
            &ctx,
        )
        .unwrap();
        assert_eq!(
            finish[0]["choices"][0]["finish_reason"],
            json!("stop")
        );
    }
}
