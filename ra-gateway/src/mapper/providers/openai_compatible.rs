//! The OpenAI-compatible provider family: one adapter pattern instantiated
//! per provider with its base URL, auth style and function subset.

use chrono::Utc;
use serde_json::{Value, json};

use super::{
    AuthStyle, BaseUrl, FunctionSupport, ProviderAdapter, RequestMap,
    ResponseTransform, openai::passthrough_chunk,
};
use crate::{
    classify::FunctionName::{
        ChatComplete, Complete, Embed, GenerateImage, StreamChatComplete,
        StreamComplete,
    },
    error::mapper::MapperError,
    mapper::{
        TransformContext,
        descriptor::{FieldMap, JsonMap, ParamDescriptor},
        stream::{chat_response_to_chunks, stamp_provider},
    },
};

/// Chat + completions + embeddings, streamed natively.
static STANDARD_FUNCTIONS: &[FunctionSupport] = &[
    FunctionSupport::passthrough(ChatComplete, "/chat/completions"),
    FunctionSupport {
        function: StreamChatComplete,
        endpoint: "/chat/completions",
        form_data: false,
        request: RequestMap::Passthrough,
        response: ResponseTransform::StreamChunk(passthrough_chunk),
    },
    FunctionSupport::passthrough(Complete, "/completions"),
    FunctionSupport {
        function: StreamComplete,
        endpoint: "/completions",
        form_data: false,
        request: RequestMap::Passthrough,
        response: ResponseTransform::StreamChunk(passthrough_chunk),
    },
    FunctionSupport::passthrough(Embed, "/embeddings"),
];

/// Re-emits a synchronously fetched canonical response as SSE chunks, for
/// providers that cannot stream a function.
fn rechunk(
    body: Value,
    ctx: &TransformContext<'_>,
) -> Result<Vec<Value>, MapperError> {
    let mut chunks = chat_response_to_chunks(body)?;
    for chunk in &mut chunks {
        stamp_provider(chunk, ctx.provider.as_ref());
    }
    Ok(chunks)
}

/// AI21 has no SSE endpoint for chat; streams are synthesized.
static AI21_FUNCTIONS: &[FunctionSupport] = &[
    FunctionSupport::passthrough(ChatComplete, "/chat/completions"),
    FunctionSupport {
        function: StreamChatComplete,
        endpoint: "/chat/completions",
        form_data: false,
        request: RequestMap::Passthrough,
        response: ResponseTransform::JsonToStream(rechunk),
    },
    FunctionSupport::passthrough(Embed, "/embeddings"),
];

fn image_width(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(split_size(body).map(|(w, _)| json!(w)))
}

fn image_height(body: &JsonMap) -> Result<Option<Value>, MapperError> {
    Ok(split_size(body).map(|(_, h)| json!(h)))
}

fn split_size(body: &JsonMap) -> Option<(u32, u32)> {
    let size = body.get("size")?.as_str()?;
    let (w, h) = size.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// The canonical `size` string fans out into `width` + `height`.
static IMAGE_MAPS: &[FieldMap] = &[
    FieldMap::new("model", &[ParamDescriptor::required("model")]),
    FieldMap::new("prompt", &[ParamDescriptor::required("prompt")]),
    FieldMap::new(
        "size",
        &[
            ParamDescriptor::with_transform("width", image_width),
            ParamDescriptor::with_transform("height", image_height),
        ],
    ),
    FieldMap::new("n", &[ParamDescriptor::copy("batch_size")]),
    FieldMap::new("seed", &[ParamDescriptor::copy("seed")]),
];

/// SiliconFlow returns `{"images": [{"url": ...}], ...}`.
fn siliconflow_images(
    body: Value,
    _ctx: &TransformContext<'_>,
) -> Result<Value, MapperError> {
    let images = body
        .get("images")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MapperError::TransformFailed(
                "image response has no images array".to_string(),
            )
        })?;
    let data: Vec<Value> = images
        .iter()
        .map(|image| json!({"url": image.get("url").cloned()
            .unwrap_or(Value::Null)}))
        .collect();
    Ok(json!({"created": Utc::now().timestamp(), "data": data}))
}

static SILICONFLOW_FUNCTIONS: &[FunctionSupport] = &[
    FunctionSupport::passthrough(ChatComplete, "/chat/completions"),
    FunctionSupport {
        function: StreamChatComplete,
        endpoint: "/chat/completions",
        form_data: false,
        request: RequestMap::Passthrough,
        response: ResponseTransform::StreamChunk(passthrough_chunk),
    },
    FunctionSupport::passthrough(Embed, "/embeddings"),
    FunctionSupport {
        function: GenerateImage,
        endpoint: "/images/generations",
        form_data: false,
        request: RequestMap::Mapped(IMAGE_MAPS),
        response: ResponseTransform::Full(siliconflow_images),
    },
];

fn workers_custom_fields(
    custom_fields: &serde_json::Map<String, Value>,
) -> Result<(), MapperError> {
    match custom_fields.get("account_id") {
        None => Ok(()),
        Some(Value::String(account_id)) if !account_id.is_empty() => Ok(()),
        Some(_) => Err(MapperError::CustomFields(
            "account_id must be a non-empty string".to_string(),
        )),
    }
}

macro_rules! openai_compatible {
    ($ident:ident, $name:literal, $base:expr) => {
        pub static $ident: ProviderAdapter = ProviderAdapter {
            name: $name,
            api_key_required: true,
            auth: AuthStyle::Bearer,
            base_url: $base,
            functions: STANDARD_FUNCTIONS,
            capabilities: &[],
            custom_fields: None,
        };
    };
}

openai_compatible!(XAI, "xai", BaseUrl::Fixed("https://api.x.ai/v1"));
openai_compatible!(
    ANYSCALE,
    "anyscale",
    BaseUrl::Fixed("https://api.endpoints.anyscale.com/v1")
);
openai_compatible!(
    DEEPSEEK,
    "deepseek",
    BaseUrl::Fixed("https://api.deepseek.com/v1")
);
openai_compatible!(
    MISTRAL,
    "mistral",
    BaseUrl::Fixed("https://api.mistral.ai/v1")
);
openai_compatible!(
    GROQ,
    "groq",
    BaseUrl::Fixed("https://api.groq.com/openai/v1")
);
openai_compatible!(
    BEDROCK,
    "bedrock",
    BaseUrl::Fixed("https://bedrock-runtime.us-east-1.amazonaws.com/openai/v1")
);
openai_compatible!(GOOGLE_VERTEX, "google-vertex", BaseUrl::CustomHostRequired);
openai_compatible!(NAMED, "openai-compatible", BaseUrl::CustomHostRequired);

pub static AI21: ProviderAdapter = ProviderAdapter {
    name: "ai21",
    api_key_required: true,
    auth: AuthStyle::Bearer,
    base_url: BaseUrl::Fixed("https://api.ai21.com/studio/v1"),
    functions: AI21_FUNCTIONS,
    capabilities: &[],
    custom_fields: None,
};

pub static SILICONFLOW: ProviderAdapter = ProviderAdapter {
    name: "siliconflow",
    api_key_required: true,
    auth: AuthStyle::Bearer,
    base_url: BaseUrl::Fixed("https://api.siliconflow.com/v1"),
    functions: SILICONFLOW_FUNCTIONS,
    capabilities: &[],
    custom_fields: None,
};

pub static WORKERS_AI: ProviderAdapter = ProviderAdapter {
    name: "workers-ai",
    api_key_required: true,
    auth: AuthStyle::Bearer,
    base_url: BaseUrl::WorkersAccount,
    functions: STANDARD_FUNCTIONS,
    capabilities: &[],
    custom_fields: Some(workers_custom_fields),
};

pub static AZURE_AI_FOUNDRY: ProviderAdapter = ProviderAdapter {
    name: "azure-ai-foundry",
    api_key_required: true,
    auth: AuthStyle::AzureApiKey,
    base_url: BaseUrl::AzureFoundry,
    functions: STANDARD_FUNCTIONS,
    capabilities: &[],
    custom_fields: None,
};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mapper::descriptor::apply_field_maps;

    #[test]
    fn size_fans_out_to_width_and_height() {
        let body = json!({
            "model": "stabilityai/stable-diffusion",
            "prompt": "a lighthouse",
            "size": "1024x768",
            "n": 2,
        });
        let mapped =
            apply_field_maps(IMAGE_MAPS, body.as_object().unwrap()).unwrap();
        assert_eq!(mapped["width"], json!(1024));
        assert_eq!(mapped["height"], json!(768));
        assert_eq!(mapped["batch_size"], json!(2));
        assert!(!mapped.contains_key("size"));
    }

    #[test]
    fn workers_custom_fields_require_string_account() {
        let mut fields = serde_json::Map::new();
        assert!(workers_custom_fields(&fields).is_ok());
        fields.insert("account_id".to_string(), json!("abc"));
        assert!(workers_custom_fields(&fields).is_ok());
        fields.insert("account_id".to_string(), json!(42));
        assert!(workers_custom_fields(&fields).is_err());
    }
}
