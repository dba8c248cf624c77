use http::{Method, StatusCode};
use http_body_util::BodyExt;
use mock_provider::MockServer;
use pretty_assertions::assert_eq;
use ra_gateway::{
    config::Config,
    tests::{TestDefault, harness::Harness},
};
use serde_json::{Value, json};

const DONE_FRAME: &str = "data: [DONE]\n\n";

fn parse_frames(raw: &str) -> Vec<Value> {
    raw.split("\n\n")
        .filter(|frame| !frame.is_empty())
        .filter_map(|frame| frame.strip_prefix("data: "))
        .filter(|payload| *payload != "[DONE]")
        .map(|payload| serde_json::from_str(payload).expect("frame is JSON"))
        .collect()
}

fn delta_contents(frames: &[Value]) -> String {
    frames
        .iter()
        .filter_map(|frame| {
            frame["choices"][0]["delta"]["content"]
                .as_str()
                .map(str::to_string)
        })
        .collect()
}

#[tokio::test]
async fn openai_stream_passes_through_with_terminator() {
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
        "messages": [{"role": "user", "content": "Hi"}],
        "stream": true,
    });

    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"))
    );

    let raw = response.into_body().collect().await.unwrap().to_bytes();
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    assert!(raw.ends_with(DONE_FRAME));

    let frames = parse_frames(&raw);
    assert!(!frames.is_empty());
    assert_eq!(delta_contents(&frames), "Hello world, this is a test.");
    // every re-emitted chunk is stamped with the provider
    assert!(frames.iter().all(|f| f["provider"] == json!("openai")));
}

#[tokio::test]
async fn anthropic_stream_translates_to_canonical_chunks() {
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
        "stream": true,
    });

    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let raw = response.into_body().collect().await.unwrap().to_bytes();
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    assert!(raw.ends_with(DONE_FRAME));

    let frames = parse_frames(&raw);
    // role chunk, content chunk, finish chunk
    assert_eq!(
        frames[0]["choices"][0]["delta"]["role"],
        json!("assistant")
    );
    assert_eq!(delta_contents(&frames), "Hello world, this is a test.");
    let last = frames.last().unwrap();
    assert_eq!(last["choices"][0]["finish_reason"], json!("stop"));
    assert!(
        frames
            .iter()
            .all(|f| f["object"] == json!("chat.completion.chunk"))
    );
    assert!(
        frames
            .iter()
            .all(|f| f["provider"] == json!("anthropic"))
    );
}

#[tokio::test]
async fn providers_without_sse_get_synthesized_streams() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;
    // ai21 has no streaming endpoint; the gateway calls it synchronously
    // and re-chunks the body
    let config = harness.direct_config(
        "ai21",
        "jamba-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    let body = json!({
        "model": "jamba-mini",
        "messages": [{"role": "user", "content": "Hi"}],
        "stream": true,
    });

    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"))
    );

    let raw = response.into_body().collect().await.unwrap().to_bytes();
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    assert!(raw.ends_with(DONE_FRAME));

    let frames = parse_frames(&raw);
    // concatenated deltas reproduce the upstream message exactly, split
    // only on whitespace into bounded pieces
    assert_eq!(delta_contents(&frames), "Hello world, this is a test.");
    for frame in &frames {
        if let Some(content) =
            frame["choices"][0]["delta"]["content"].as_str()
        {
            assert!(content.len() <= 50);
        }
    }
    let last = frames.last().unwrap();
    assert_eq!(last["choices"][0]["finish_reason"], json!("stop"));
}
