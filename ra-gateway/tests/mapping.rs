use pretty_assertions::assert_eq;
use ra_gateway::{
    classify::FunctionName,
    mapper::{self, TransformContext, providers},
    types::{config::ResolvedTarget, provider::InferenceProvider},
};
use serde_json::json;

fn target(
    provider: InferenceProvider,
    custom_host: Option<&str>,
) -> ResolvedTarget {
    ResolvedTarget {
        provider,
        model: Some("test-model".to_string()),
        api_key: Some("sk-test".to_string().into()),
        params: Default::default(),
        custom_host: custom_host.map(str::to_string),
        azure_ai_foundry_url: None,
        weight: 1.0,
        cache: None,
        retry: None,
    }
}

#[test]
fn every_shipped_adapter_supports_chat() {
    for provider in [
        InferenceProvider::OpenAI,
        InferenceProvider::Anthropic,
        InferenceProvider::WorkersAI,
        InferenceProvider::XAI,
        InferenceProvider::Anyscale,
        InferenceProvider::AI21,
        InferenceProvider::SiliconFlow,
        InferenceProvider::Deepseek,
        InferenceProvider::Mistral,
        InferenceProvider::Groq,
        InferenceProvider::Bedrock,
        InferenceProvider::AzureAIFoundry,
        InferenceProvider::GoogleVertex,
    ] {
        let adapter = providers::adapter_for(&provider);
        assert!(
            adapter.support(FunctionName::ChatComplete).is_some(),
            "{provider} must support chat completions"
        );
        assert!(
            adapter
                .support(FunctionName::StreamChatComplete)
                .is_some(),
            "{provider} must support streaming chat"
        );
    }
}

#[test]
fn unsupported_functions_have_no_entry() {
    let adapter = providers::adapter_for(&InferenceProvider::Anthropic);
    assert!(adapter.support(FunctionName::Embed).is_none());
    assert!(adapter.support(FunctionName::GenerateImage).is_none());
}

#[test]
fn canonical_chat_body_maps_for_every_chat_provider() {
    let body = json!({
        "model": "test-model",
        "messages": [{"role": "user", "content": "Hi"}],
        "temperature": 0.5,
        "max_tokens": 64,
    })
    .as_object()
    .cloned()
    .unwrap();

    for provider in
        [InferenceProvider::OpenAI, InferenceProvider::Anthropic]
    {
        let adapter = providers::adapter_for(&provider);
        let support = adapter.support(FunctionName::ChatComplete).unwrap();
        let mapped = mapper::build_provider_body(
            adapter,
            support,
            &body,
            "test-model",
        )
        .expect("valid canonical body always maps");
        assert_eq!(mapped["model"], json!("test-model"));
        assert!(mapped.contains_key("messages"));
    }
}

#[test]
fn reasoning_models_get_max_completion_tokens() {
    let body = json!({
        "model": "o3-mini",
        "messages": [{"role": "user", "content": "Hi"}],
        "max_tokens": 64,
        "temperature": 0.5,
    })
    .as_object()
    .cloned()
    .unwrap();

    let adapter = providers::adapter_for(&InferenceProvider::OpenAI);
    let support = adapter.support(FunctionName::ChatComplete).unwrap();
    let mapped =
        mapper::build_provider_body(adapter, support, &body, "o3-mini")
            .unwrap();
    assert_eq!(mapped["max_completion_tokens"], json!(64));
    assert!(!mapped.contains_key("max_tokens"));
    assert!(!mapped.contains_key("temperature"));

    // non-reasoning models keep the original parameters
    let mapped =
        mapper::build_provider_body(adapter, support, &body, "gpt-4o")
            .unwrap();
    assert_eq!(mapped["max_tokens"], json!(64));
    assert_eq!(mapped["temperature"], json!(0.5));
}

#[test]
fn workers_ai_derives_base_url_from_account_id() {
    let adapter = providers::adapter_for(&InferenceProvider::WorkersAI);
    let url = adapter
        .resolve_base_url(&target(
            InferenceProvider::WorkersAI,
            Some("acct-123"),
        ))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.cloudflare.com/client/v4/accounts/acct-123/ai/v1"
    );

    // a full URL in custom_host is taken as-is
    let url = adapter
        .resolve_base_url(&target(
            InferenceProvider::WorkersAI,
            Some("http://localhost:9999/v1"),
        ))
        .unwrap();
    assert_eq!(url.as_str(), "http://localhost:9999/v1");

    // and the account id is mandatory
    assert!(
        adapter
            .resolve_base_url(&target(InferenceProvider::WorkersAI, None))
            .is_err()
    );
}

#[test]
fn named_providers_fall_back_to_openai_compatible() {
    let provider = InferenceProvider::Named("together".into());
    let adapter = providers::adapter_for(&provider);
    assert!(adapter.support(FunctionName::ChatComplete).is_some());
    // a named provider has no default base URL
    assert!(
        adapter
            .resolve_base_url(&target(provider.clone(), None))
            .is_err()
    );
    assert!(
        adapter
            .resolve_base_url(&target(
                provider,
                Some("https://api.together.xyz/v1")
            ))
            .is_ok()
    );
}

#[test]
fn auth_headers_follow_the_provider_style() {
    let adapter = providers::adapter_for(&InferenceProvider::OpenAI);
    let headers =
        adapter.headers(&target(InferenceProvider::OpenAI, None)).unwrap();
    assert_eq!(
        headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer sk-test"
    );

    let adapter = providers::adapter_for(&InferenceProvider::Anthropic);
    let headers = adapter
        .headers(&target(InferenceProvider::Anthropic, None))
        .unwrap();
    assert_eq!(headers.get("x-api-key").unwrap().to_str().unwrap(), "sk-test");
    assert!(headers.get("anthropic-version").is_some());
    assert!(headers.get("authorization").is_none());
}

#[test]
fn anthropic_success_transform_satisfies_the_canonical_shape() {
    let adapter = providers::adapter_for(&InferenceProvider::Anthropic);
    let support = adapter.support(FunctionName::ChatComplete).unwrap();
    let ctx = TransformContext {
        provider: &InferenceProvider::Anthropic,
        function: FunctionName::ChatComplete,
        model: "claude-3-haiku-20240307",
        strict_openai_compliance: true,
    };
    let upstream = json!({
        "id": "msg_1",
        "type": "message",
        "model": "claude-3-haiku-20240307",
        "content": [{"type": "text", "text": "Hi there"}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 1, "output_tokens": 2},
    });
    let canonical =
        mapper::transform_success(support, &ctx, upstream).unwrap();
    assert!(mapper::expected_shape_ok(
        FunctionName::ChatComplete,
        &canonical
    ));

    // a 200 with a foreign shape is rejected (translated to a 502 by the
    // pipeline)
    let junk = json!({"ok": true});
    assert!(mapper::transform_success(support, &ctx, junk).is_err());
}
