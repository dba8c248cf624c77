use serde_json::Value;

use super::{
    AuthStyle, BaseUrl, FunctionSupport, ProviderAdapter, RequestMap,
    ResponseTransform,
};
use crate::{
    classify::FunctionName::*,
    error::mapper::MapperError,
    mapper::{
        TransformContext,
        capability::{CapabilityRule, ParamAction},
        stream::{StreamState, stamp_provider},
    },
};

/// Reasoning-model families replace `max_tokens` and reject sampling
/// parameters.
static CAPABILITIES: &[CapabilityRule] = &[
    CapabilityRule::new(
        &["o1", "o3", "o4", "gpt-5"],
        "max_tokens",
        ParamAction::Rename("max_completion_tokens"),
    ),
    CapabilityRule::new(
        &["o1", "o3", "o4", "gpt-5"],
        "temperature",
        ParamAction::Unsupported,
    ),
    CapabilityRule::new(
        &["o1", "o3", "o4", "gpt-5"],
        "top_p",
        ParamAction::Unsupported,
    ),
];

/// Chunk transform for upstreams that already emit OpenAI-shaped SSE:
/// parse, stamp the provider in, re-emit.
pub(super) fn passthrough_chunk(
    payload: &str,
    _state: &mut StreamState,
    ctx: &TransformContext<'_>,
) -> Result<Vec<Value>, MapperError> {
    match serde_json::from_str::<Value>(payload) {
        Ok(mut chunk) => {
            stamp_provider(&mut chunk, ctx.provider.as_ref());
            Ok(vec![chunk])
        }
        Err(error) => {
            tracing::warn!(error = %error, "skipping unparseable SSE chunk");
            Ok(Vec::new())
        }
    }
}

static FUNCTIONS: &[FunctionSupport] = &[
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
    FunctionSupport::passthrough(GenerateImage, "/images/generations"),
    FunctionSupport::passthrough(Moderate, "/moderations"),
    FunctionSupport::passthrough(CreateSpeech, "/audio/speech"),
    FunctionSupport::multipart(Transcribe, "/audio/transcriptions"),
    FunctionSupport::multipart(Translate, "/audio/translations"),
    FunctionSupport::passthrough(ListFiles, "/files"),
    FunctionSupport::multipart(UploadFile, "/files"),
    FunctionSupport::passthrough(GetFile, "{path}"),
    FunctionSupport::passthrough(DeleteFile, "{path}"),
    FunctionSupport::passthrough(GetFileContent, "{path}"),
    FunctionSupport::passthrough(CreateFineTuning, "/fine_tuning/jobs"),
    FunctionSupport::passthrough(ListFineTuning, "/fine_tuning/jobs"),
    FunctionSupport::passthrough(GetFineTuning, "{path}"),
    FunctionSupport::passthrough(CancelFineTuning, "{path}"),
    FunctionSupport::passthrough(ListFineTuningEvents, "{path}"),
    FunctionSupport::passthrough(CreateBatch, "/batches"),
    FunctionSupport::passthrough(ListBatches, "/batches"),
    FunctionSupport::passthrough(GetBatch, "{path}"),
    FunctionSupport::passthrough(CancelBatch, "{path}"),
    FunctionSupport::passthrough(CreateModelResponse, "/responses"),
    FunctionSupport {
        function: StreamModelResponse,
        endpoint: "/responses",
        form_data: false,
        request: RequestMap::Passthrough,
        response: ResponseTransform::StreamChunk(passthrough_chunk),
    },
    FunctionSupport::passthrough(GetModelResponse, "{path}"),
    FunctionSupport::passthrough(DeleteModelResponse, "{path}"),
    FunctionSupport::passthrough(ListModels, "/models"),
    FunctionSupport::passthrough(GetModel, "{path}"),
];

pub static OPENAI: ProviderAdapter = ProviderAdapter {
    name: "openai",
    api_key_required: true,
    auth: AuthStyle::Bearer,
    base_url: BaseUrl::Fixed("https://api.openai.com/v1"),
    functions: FUNCTIONS,
    capabilities: CAPABILITIES,
    custom_fields: None,
};
