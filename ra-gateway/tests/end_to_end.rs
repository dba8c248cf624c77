use std::time::Duration;

use http::{Method, StatusCode};
use http_body_util::BodyExt;
use mock_provider::MockServer;
use pretty_assertions::assert_eq;
use ra_gateway::{
    config::Config,
    tests::{TestDefault, harness::Harness},
    types::log::CacheStatus,
};
use serde_json::json;

async fn wait_for_logs(harness: &Harness) -> Vec<ra_gateway::types::log::Log> {
    // log emission is spawned off the request path
    for _ in 0..50 {
        let logs = harness
            .state
            .store()
            .list_logs(None, 10)
            .await
            .unwrap();
        if !logs.is_empty() {
            return logs;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no log was emitted");
}

#[tokio::test]
async fn chat_completion_happy_path_via_anthropic() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;

    let config = harness.direct_config(
        "anthropic",
        "claude-3-haiku-20240307",
        "sk-ant-test",
        Some(&mock.url()),
    );
    let body = json!({
        "model": "claude-3-haiku-20240307",
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let request = harness.request(
        Method::POST,
        "/v1/chat/completions",
        &config,
        Some(&body),
    );

    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    // the emitted body must parse as an OpenAI client response
    let parsed = serde_json::from_slice::<
        async_openai::types::CreateChatCompletionResponse,
    >(&bytes)
    .expect("gateway output is OpenAI-compatible");
    assert_eq!(
        parsed.choices[0].message.content.as_deref(),
        Some("Hello world, this is a test.")
    );

    assert_eq!(
        mock.state
            .anthropic_hits
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );

    let logs = wait_for_logs(&harness).await;
    let log = &logs[0];
    assert_eq!(log.function_name, "chat_complete");
    assert_eq!(log.ai_provider.as_ref(), "anthropic");
    assert_eq!(log.cache_status, CacheStatus::Miss);
    assert_eq!(log.status, 200);
    assert_eq!(log.ai_provider_request_log.status, 200);
    assert_eq!(log.agent_id, harness.agent.id);
    assert_eq!(log.skill_id, harness.skill.id);
}

#[tokio::test]
async fn tool_calls_pass_through_and_are_captured() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;

    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    let body = json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "2+2?"}],
        "tools": [{
            "type": "function",
            "function": {
                "name": "calculate",
                "parameters": {"type": "object", "properties": {}},
            },
        }],
        "tool_choice": "auto",
    });
    let request = harness.request(
        Method::POST,
        "/v1/chat/completions",
        &config,
        Some(&body),
    );

    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        parsed["choices"][0]["message"]["tool_calls"][0]["function"]
            ["name"],
        json!("calculate")
    );
    assert_eq!(
        parsed["choices"][0]["finish_reason"],
        json!("tool_calls")
    );

    // tool capture is fire-and-forget; poll for the record
    let mut tools = Vec::new();
    for _ in 0..50 {
        tools = harness
            .state
            .store()
            .list_tools(harness.agent.id)
            .await
            .unwrap();
        if !tools.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "calculate");
    assert_eq!(tools[0].hash.len(), 64);
    // the hash is deterministic over the tool definition
    assert_eq!(
        tools[0].hash,
        ra_gateway::cache::fingerprint::tool_hash(&tools[0].definition)
    );
}

#[tokio::test]
async fn transient_upstream_errors_are_retried() {
    let mock = MockServer::spawn().await;
    mock.state
        .openai_fail_status
        .store(503, std::sync::atomic::Ordering::SeqCst);
    mock.state
        .openai_fail_times
        .store(2, std::sync::atomic::Ordering::SeqCst);

    let harness = Harness::new(Config::test_default()).await;
    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    let body = json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let request = harness.request(
        Method::POST,
        "/v1/chat/completions",
        &config,
        Some(&body),
    );

    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        mock.state
            .openai_hits
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

#[tokio::test]
async fn upstream_client_errors_surface_as_tagged_canonical_errors() {
    let mock = MockServer::spawn().await;
    mock.state
        .openai_fail_status
        .store(401, std::sync::atomic::Ordering::SeqCst);
    mock.state
        .openai_fail_times
        .store(1, std::sync::atomic::Ordering::SeqCst);

    let harness = Harness::new(Config::test_default()).await;
    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "bad-key",
        Some(&mock.openai_base()),
    );
    let body = json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let request = harness.request(
        Method::POST,
        "/v1/chat/completions",
        &config,
        Some(&body),
    );

    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    // canonical error shape, tagged with the provider
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["provider"], json!("openai"));
    assert!(parsed["error"]["message"].is_string());
    // and it still parses as an OpenAI client error
    serde_json::from_slice::<async_openai::error::WrappedError>(&bytes)
        .expect("error body is OpenAI-shaped");
    // a 401 is not retryable
    assert_eq!(
        mock.state
            .openai_hits
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn unauthorized_without_token() {
    let harness = Harness::new(Config::test_default()).await;
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .body(ra_gateway::types::body::Body::empty())
        .unwrap();
    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_route_is_a_404() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;
    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    let request = harness.request(
        Method::POST,
        "/v1/totally/unknown",
        &config,
        Some(&json!({})),
    );
    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_body_is_rejected_before_dispatch() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;
    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    // unknown top-level field
    let body = json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "Hi"}],
        "frobnicate": true,
    });
    let request = harness.request(
        Method::POST,
        "/v1/chat/completions",
        &config,
        Some(&body),
    );
    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        mock.state
            .openai_hits
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}
