use http::Method;
use ra_gateway::classify::{FunctionName, classify};
use strum::IntoEnumIterator;

/// A representative `(method, path, stream)` triple for every function in
/// the route table.
fn representative(
    function: FunctionName,
) -> (Method, &'static str, bool) {
    use FunctionName::*;
    match function {
        ChatComplete => (Method::POST, "/v1/chat/completions", false),
        StreamChatComplete => (Method::POST, "/v1/chat/completions", true),
        Complete => (Method::POST, "/v1/completions", false),
        StreamComplete => (Method::POST, "/v1/completions", true),
        Embed => (Method::POST, "/v1/embeddings", false),
        GenerateImage => (Method::POST, "/v1/images/generations", false),
        Moderate => (Method::POST, "/v1/moderations", false),
        CreateSpeech => (Method::POST, "/v1/audio/speech", false),
        Transcribe => (Method::POST, "/v1/audio/transcriptions", false),
        Translate => (Method::POST, "/v1/audio/translations", false),
        ListFiles => (Method::GET, "/v1/files", false),
        UploadFile => (Method::POST, "/v1/files", false),
        GetFile => (Method::GET, "/v1/files/file-abc", false),
        DeleteFile => (Method::DELETE, "/v1/files/file-abc", false),
        GetFileContent => (Method::GET, "/v1/files/file-abc/content", false),
        CreateFineTuning => (Method::POST, "/v1/fine_tuning/jobs", false),
        ListFineTuning => (Method::GET, "/v1/fine_tuning/jobs", false),
        GetFineTuning => (Method::GET, "/v1/fine_tuning/jobs/ftjob-1", false),
        CancelFineTuning => {
            (Method::POST, "/v1/fine_tuning/jobs/ftjob-1/cancel", false)
        }
        ListFineTuningEvents => {
            (Method::GET, "/v1/fine_tuning/jobs/ftjob-1/events", false)
        }
        CreateBatch => (Method::POST, "/v1/batches", false),
        ListBatches => (Method::GET, "/v1/batches", false),
        GetBatch => (Method::GET, "/v1/batches/batch_1", false),
        CancelBatch => (Method::POST, "/v1/batches/batch_1/cancel", false),
        CreateModelResponse => (Method::POST, "/v1/responses", false),
        StreamModelResponse => (Method::POST, "/v1/responses", true),
        GetModelResponse => (Method::GET, "/v1/responses/resp_1", false),
        DeleteModelResponse => {
            (Method::DELETE, "/v1/responses/resp_1", false)
        }
        ListModels => (Method::GET, "/v1/models", false),
        GetModel => (Method::GET, "/v1/models/gpt-4o", false),
    }
}

#[test]
fn every_function_is_reachable_from_the_table() {
    for function in FunctionName::iter() {
        let (method, path, stream) = representative(function);
        assert_eq!(
            classify(&method, path, stream),
            Some(function),
            "expected {method} {path} (stream={stream}) to classify as \
             {function}"
        );
    }
}

#[test]
fn stream_flag_alone_distinguishes_variants() {
    assert_eq!(
        classify(&Method::POST, "/v1/responses", true),
        Some(FunctionName::StreamModelResponse)
    );
    assert_eq!(
        classify(&Method::POST, "/v1/responses", false),
        Some(FunctionName::CreateModelResponse)
    );
}

#[test]
fn matching_path_with_wrong_method_is_unclassified() {
    for function in FunctionName::iter() {
        let (method, path, stream) = representative(function);
        let other = if method == Method::POST {
            Method::PUT
        } else {
            Method::PATCH
        };
        assert_eq!(
            classify(&other, path, stream),
            None,
            "expected {other} {path} to be unclassified"
        );
    }
}

#[test]
fn unknown_paths_are_unclassified() {
    assert_eq!(classify(&Method::POST, "/v1/unknown", false), None);
    assert_eq!(classify(&Method::POST, "/v2/chat/completions", false), None);
    assert_eq!(classify(&Method::GET, "/", false), None);
}
