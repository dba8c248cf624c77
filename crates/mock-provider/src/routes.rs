use std::sync::atomic::Ordering;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::MockState;

const CONTENT: &str = "Hello world, this is a test.";

fn sse_body(frames: Vec<Value>) -> Response {
    let mut out = String::new();
    for frame in frames {
        out.push_str("data: ");
        out.push_str(&frame.to_string());
        out.push_str("\n\n");
    }
    out.push_str("data: [DONE]\n\n");
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from(out))
        .expect("static response")
}

fn openai_error(status: StatusCode) -> Response {
    let body = json!({
        "error": {
            "message": format!("mock upstream failure ({status})"),
            "type": "server_error",
        }
    });
    (status, Json(body)).into_response()
}

pub async fn openai_chat(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Response {
    state.openai_hits.fetch_add(1, Ordering::SeqCst);

    let remaining = state.openai_fail_times.load(Ordering::SeqCst);
    if remaining > 0 {
        state
            .openai_fail_times
            .store(remaining - 1, Ordering::SeqCst);
        let status = state.openai_fail_status.load(Ordering::SeqCst);
        let status = StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return openai_error(status);
    }

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("mock-model")
        .to_string();
    let stream = body
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let wants_tools = body.get("tools").is_some();

    if stream {
        let frames = vec![
            json!({
                "id": "chatcmpl-mock", "object": "chat.completion.chunk",
                "created": 1700000000, "model": model,
                "choices": [{"index": 0,
                             "delta": {"role": "assistant"},
                             "finish_reason": Value::Null}],
            }),
            json!({
                "id": "chatcmpl-mock", "object": "chat.completion.chunk",
                "created": 1700000000, "model": model,
                "choices": [{"index": 0,
                             "delta": {"content": CONTENT},
                             "finish_reason": Value::Null}],
            }),
            json!({
                "id": "chatcmpl-mock", "object": "chat.completion.chunk",
                "created": 1700000000, "model": model,
                "choices": [{"index": 0, "delta": {},
                             "finish_reason": "stop"}],
            }),
        ];
        return sse_body(frames);
    }

    let message = if wants_tools {
        let name = body
            .pointer("/tools/0/function/name")
            .and_then(Value::as_str)
            .unwrap_or("tool");
        json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": [{
                "id": "call_mock_1",
                "type": "function",
                "function": {"name": name, "arguments": "{\"a\":2,\"b\":2}"},
            }],
        })
    } else {
        json!({"role": "assistant", "content": CONTENT})
    };
    let finish_reason = if wants_tools { "tool_calls" } else { "stop" };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1700000000,
        "model": model,
        "choices": [{"index": 0, "message": message,
                     "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 9, "completion_tokens": 12,
                  "total_tokens": 21},
    }))
    .into_response()
}

pub async fn openai_embeddings(
    State(_state): State<MockState>,
    Json(body): Json<Value>,
) -> Response {
    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("mock-embed")
        .to_string();
    Json(json!({
        "object": "list",
        "data": [{"object": "embedding",
                  "embedding": [0.1, 0.2, 0.3], "index": 0}],
        "model": model,
        "usage": {"prompt_tokens": 3, "completion_tokens": 0,
                  "total_tokens": 3},
    }))
    .into_response()
}

pub async fn anthropic_messages(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.anthropic_hits.fetch_add(1, Ordering::SeqCst);

    if headers.get("x-api-key").is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "type": "error",
                "error": {"type": "authentication_error",
                          "message": "missing x-api-key"},
            })),
        )
            .into_response();
    }

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("claude-mock")
        .to_string();
    let stream = body
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if stream {
        let frames = vec![
            json!({"type": "message_start",
                   "message": {"id": "msg_mock", "model": model}}),
            json!({"type": "content_block_start", "index": 0,
                   "content_block": {"type": "text", "text": ""}}),
            json!({"type": "content_block_delta", "index": 0,
                   "delta": {"type": "text_delta", "text": CONTENT}}),
            json!({"type": "message_delta",
                   "delta": {"stop_reason": "end_turn"},
                   "usage": {"output_tokens": 12}}),
            json!({"type": "message_stop"}),
        ];
        return sse_body(frames);
    }

    Json(json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": [{"type": "text", "text": CONTENT}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 9, "output_tokens": 12},
    }))
    .into_response()
}

pub async fn hook_allow(State(state): State<MockState>) -> Response {
    state.hook_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"deny_request": false, "skipped": false})).into_response()
}

pub async fn hook_deny(State(state): State<MockState>) -> Response {
    state.hook_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"deny_request": true, "skipped": false})).into_response()
}

pub async fn hook_override(
    State(state): State<MockState>,
    Json(document): Json<Value>,
) -> Response {
    state.hook_hits.fetch_add(1, Ordering::SeqCst);
    // echo the request back with a marker so tests can see the override
    let mut overridden = document
        .get("request_body")
        .cloned()
        .unwrap_or_else(|| json!({}));
    if let Some(map) = overridden.as_object_mut() {
        map.insert("user".to_string(), json!("overridden-user"));
    }
    Json(json!({
        "deny_request": false,
        "skipped": false,
        "request_body_override": overridden,
    }))
    .into_response()
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": {"message": "no such mock route"}})),
    )
        .into_response()
}
