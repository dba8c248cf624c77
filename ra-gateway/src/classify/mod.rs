use std::sync::LazyLock;

use http::Method;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The ~30 canonical dispatch kinds the gateway understands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FunctionName {
    ChatComplete,
    StreamChatComplete,
    Complete,
    StreamComplete,
    Embed,
    GenerateImage,
    Moderate,
    CreateSpeech,
    Transcribe,
    Translate,
    ListFiles,
    UploadFile,
    GetFile,
    DeleteFile,
    GetFileContent,
    CreateFineTuning,
    ListFineTuning,
    GetFineTuning,
    CancelFineTuning,
    ListFineTuningEvents,
    CreateBatch,
    ListBatches,
    GetBatch,
    CancelBatch,
    CreateModelResponse,
    StreamModelResponse,
    GetModelResponse,
    DeleteModelResponse,
    ListModels,
    GetModel,
}

impl FunctionName {
    /// Whether the function produces an SSE stream.
    #[must_use]
    pub fn is_stream(self) -> bool {
        matches!(
            self,
            Self::StreamChatComplete
                | Self::StreamComplete
                | Self::StreamModelResponse
        )
    }

    /// Chat-completion-shaped and responses-API-shaped functions are the
    /// ones that may declare tools.
    #[must_use]
    pub fn carries_tools(self) -> bool {
        matches!(
            self,
            Self::ChatComplete
                | Self::StreamChatComplete
                | Self::CreateModelResponse
                | Self::StreamModelResponse
        )
    }

    /// Embed functions run input hooks only.
    #[must_use]
    pub fn is_embed(self) -> bool {
        matches!(self, Self::Embed)
    }

    /// Whether responses for this function are eligible for the request
    /// cache. Streaming responses are never cached.
    #[must_use]
    pub fn is_cacheable(self) -> bool {
        !self.is_stream()
    }

    /// Whether a JSON request body is expected (and validated).
    #[must_use]
    pub fn expects_json_body(self) -> bool {
        matches!(
            self,
            Self::ChatComplete
                | Self::StreamChatComplete
                | Self::Complete
                | Self::StreamComplete
                | Self::Embed
                | Self::GenerateImage
                | Self::Moderate
                | Self::CreateSpeech
                | Self::CreateFineTuning
                | Self::CreateBatch
                | Self::CreateModelResponse
                | Self::StreamModelResponse
        )
    }
}

struct Route {
    pattern: Regex,
    method: Method,
    stream: bool,
    function: FunctionName,
}

impl Route {
    fn new(
        pattern: &str,
        method: Method,
        stream: bool,
        function: FunctionName,
    ) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("route patterns are valid"),
            method,
            stream,
            function,
        }
    }
}

const ID: &str = "[A-Za-z0-9_.:-]+";

/// Ordered route table. More specific paths (`/content`, `/cancel`,
/// `/events`) come before their generic `/{id}` rows so the first match
/// wins.
static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    use FunctionName::*;
    let file_content = format!(r"^/v1/files/{ID}/content$");
    let file = format!(r"^/v1/files/{ID}$");
    let ft_cancel = format!(r"^/v1/fine_tuning/jobs/{ID}/cancel$");
    let ft_events = format!(r"^/v1/fine_tuning/jobs/{ID}/events$");
    let ft_job = format!(r"^/v1/fine_tuning/jobs/{ID}$");
    let batch_cancel = format!(r"^/v1/batches/{ID}/cancel$");
    let batch = format!(r"^/v1/batches/{ID}$");
    let response = format!(r"^/v1/responses/{ID}$");
    let model = format!(r"^/v1/models/{ID}$");
    vec![
        Route::new(r"^/v1/chat/completions$", Method::POST, true, StreamChatComplete),
        Route::new(r"^/v1/chat/completions$", Method::POST, false, ChatComplete),
        Route::new(r"^/v1/completions$", Method::POST, true, StreamComplete),
        Route::new(r"^/v1/completions$", Method::POST, false, Complete),
        Route::new(r"^/v1/embeddings$", Method::POST, false, Embed),
        Route::new(r"^/v1/images/generations$", Method::POST, false, GenerateImage),
        Route::new(r"^/v1/moderations$", Method::POST, false, Moderate),
        Route::new(r"^/v1/audio/speech$", Method::POST, false, CreateSpeech),
        Route::new(r"^/v1/audio/transcriptions$", Method::POST, false, Transcribe),
        Route::new(r"^/v1/audio/translations$", Method::POST, false, Translate),
        Route::new(r"^/v1/files$", Method::GET, false, ListFiles),
        Route::new(r"^/v1/files$", Method::POST, false, UploadFile),
        Route::new(&file_content, Method::GET, false, GetFileContent),
        Route::new(&file, Method::GET, false, GetFile),
        Route::new(&file, Method::DELETE, false, DeleteFile),
        Route::new(r"^/v1/fine_tuning/jobs$", Method::POST, false, CreateFineTuning),
        Route::new(r"^/v1/fine_tuning/jobs$", Method::GET, false, ListFineTuning),
        Route::new(&ft_cancel, Method::POST, false, CancelFineTuning),
        Route::new(&ft_events, Method::GET, false, ListFineTuningEvents),
        Route::new(&ft_job, Method::GET, false, GetFineTuning),
        Route::new(r"^/v1/batches$", Method::POST, false, CreateBatch),
        Route::new(r"^/v1/batches$", Method::GET, false, ListBatches),
        Route::new(&batch_cancel, Method::POST, false, CancelBatch),
        Route::new(&batch, Method::GET, false, GetBatch),
        Route::new(r"^/v1/responses$", Method::POST, true, StreamModelResponse),
        Route::new(r"^/v1/responses$", Method::POST, false, CreateModelResponse),
        Route::new(&response, Method::GET, false, GetModelResponse),
        Route::new(&response, Method::DELETE, false, DeleteModelResponse),
        Route::new(r"^/v1/models$", Method::GET, false, ListModels),
        Route::new(&model, Method::GET, false, GetModel),
    ]
});

/// Matches `(method, path, body.stream == true)` against the route table and
/// returns the first hit. `None` means no route exists; the middleware turns
/// that into a 404.
#[must_use]
pub fn classify(
    method: &Method,
    path: &str,
    stream: bool,
) -> Option<FunctionName> {
    ROUTES
        .iter()
        .find(|route| {
            route.method == *method
                && route.stream == stream
                && route.pattern.is_match(path)
        })
        .map(|route| route.function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_flag_selects_streaming_variant() {
        assert_eq!(
            classify(&Method::POST, "/v1/chat/completions", true),
            Some(FunctionName::StreamChatComplete)
        );
        assert_eq!(
            classify(&Method::POST, "/v1/chat/completions", false),
            Some(FunctionName::ChatComplete)
        );
    }

    #[test]
    fn method_mismatch_is_unclassified() {
        assert_eq!(classify(&Method::GET, "/v1/chat/completions", false), None);
        assert_eq!(classify(&Method::POST, "/v1/models", false), None);
    }

    #[test]
    fn specific_rows_win_over_id_rows() {
        assert_eq!(
            classify(&Method::GET, "/v1/files/file-abc123/content", false),
            Some(FunctionName::GetFileContent)
        );
        assert_eq!(
            classify(&Method::GET, "/v1/files/file-abc123", false),
            Some(FunctionName::GetFile)
        );
        assert_eq!(
            classify(&Method::POST, "/v1/batches/batch_1/cancel", false),
            Some(FunctionName::CancelBatch)
        );
    }

    #[test]
    fn regexes_are_anchored() {
        assert_eq!(
            classify(&Method::POST, "/v1/chat/completions/extra", false),
            None
        );
        assert_eq!(
            classify(&Method::POST, "/prefix/v1/chat/completions", false),
            None
        );
    }
}
