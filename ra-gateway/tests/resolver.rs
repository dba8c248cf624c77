use std::sync::atomic::Ordering;

use http::{Method, StatusCode};
use http_body_util::BodyExt;
use mock_provider::MockServer;
use pretty_assertions::assert_eq;
use ra_gateway::{
    config::Config,
    tests::{TestDefault, harness::Harness},
    types::{agent::ConfigurationParams, provider::InferenceProvider},
};
use serde_json::json;

#[tokio::test]
async fn stored_configuration_resolves_model_key_and_prompt() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;

    let key_id = harness
        .seed_provider_key(InferenceProvider::OpenAI, "sk-stored")
        .await;
    let model_id = harness.seed_model("gpt-4o-mini", key_id).await;
    harness
        .seed_configuration(
            "support-v1",
            ConfigurationParams {
                model_id: Some(model_id),
                system_prompt: Some(
                    "You are {{persona}}, be {{tone}}.".to_string(),
                ),
                temperature: Some(0.3),
                ..Default::default()
            },
        )
        .await;

    let config = json!({
        "agent_name": harness.agent.name,
        "skill_name": harness.skill.name,
        "targets": [{
            "configuration_name": "support-v1",
            "system_prompt_variables": {"persona": "a librarian"},
            // the stored key points at the real provider URL; route the
            // call at the mock instead
            "custom_host": mock.openai_base(),
        }],
    });
    let body = json!({
        "model": "ignored-client-model",
        "messages": [{"role": "user", "content": "Hi"}],
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    // the configuration's model was dispatched, not the client's
    assert_eq!(parsed["model"], json!("gpt-4o-mini"));
    assert_eq!(mock.state.openai_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_configuration_is_a_422_naming_it() {
    let harness = Harness::new(Config::test_default()).await;
    let config = json!({
        "agent_name": harness.agent.name,
        "skill_name": harness.skill.name,
        "targets": [{"configuration_name": "missing-config"}],
    });
    let body = json!({
        "model": "m",
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(
        parsed["error"]["message"]
            .as_str()
            .unwrap()
            .contains("missing-config")
    );
}

#[tokio::test]
async fn target_must_name_exactly_one_of_configuration_or_provider() {
    let harness = Harness::new(Config::test_default()).await;
    for target in [
        json!({}),
        json!({"configuration_name": "a", "provider": "openai",
               "model": "m"}),
    ] {
        let config = json!({
            "agent_name": harness.agent.name,
            "skill_name": harness.skill.name,
            "targets": [target],
        });
        let response = harness
            .call(harness.request(
                Method::POST,
                "/v1/chat/completions",
                &config,
                Some(&json!({
                    "model": "m",
                    "messages": [{"role": "user", "content": "Hi"}],
                })),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn direct_provider_requires_model_and_key() {
    let harness = Harness::new(Config::test_default()).await;

    // provider without model
    let config = json!({
        "agent_name": harness.agent.name,
        "skill_name": harness.skill.name,
        "targets": [{"provider": "openai", "api_key": "sk"}],
    });
    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&json!({
                "model": "m",
                "messages": [{"role": "user", "content": "Hi"}],
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // provider without api_key
    let config = json!({
        "agent_name": harness.agent.name,
        "skill_name": harness.skill.name,
        "targets": [{"provider": "openai", "model": "gpt-4o-mini"}],
    });
    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&json!({
                "model": "m",
                "messages": [{"role": "user", "content": "Hi"}],
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_agent_and_skill_are_404s() {
    let harness = Harness::new(Config::test_default()).await;
    let body = json!({
        "model": "m",
        "messages": [{"role": "user", "content": "Hi"}],
    });

    let config = json!({
        "agent_name": "no-such-agent",
        "skill_name": harness.skill.name,
        "targets": [{"provider": "openai", "model": "m", "api_key": "sk"}],
    });
    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let config = json!({
        "agent_name": harness.agent.name,
        "skill_name": "no-such-skill",
        "targets": [{"provider": "openai", "model": "m", "api_key": "sk"}],
    });
    let response = harness
        .call(harness.request(
            Method::POST,
            "/v1/chat/completions",
            &config,
            Some(&body),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_config_header_is_a_422() {
    let harness = Harness::new(Config::test_default()).await;
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header("authorization", "Bearer test-token")
        .header("content-type", "application/json")
        .body(ra_gateway::types::body::Body::from(
            json!({
                "model": "m",
                "messages": [{"role": "user", "content": "Hi"}],
            })
            .to_string(),
        ))
        .unwrap();
    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn config_header_alias_is_accepted() {
    let mock = MockServer::spawn().await;
    let harness = Harness::new(Config::test_default()).await;
    let config = harness.direct_config(
        "openai",
        "gpt-4o-mini",
        "sk-test",
        Some(&mock.openai_base()),
    );
    let request = http::Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header("authorization", "Bearer test-token")
        .header("content-type", "application/json")
        // the alias header instead of x-idk-config
        .header("ra-config", config.to_string())
        .body(ra_gateway::types::body::Body::from(
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hi"}],
            })
            .to_string(),
        ))
        .unwrap();
    let response = harness.call(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}
