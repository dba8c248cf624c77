pub mod audio;
pub mod batches;
pub mod chat;
pub mod completions;
pub mod embeddings;
pub mod files;
pub mod fine_tuning;
pub mod images;
pub mod moderations;
pub mod responses;
pub mod stream;

use serde::de::DeserializeOwned;

use crate::{
    classify::FunctionName, error::invalid_req::InvalidRequestError,
};

fn check<T: DeserializeOwned>(
    body: &serde_json::Value,
) -> Result<(), InvalidRequestError> {
    let deserializer = body.clone();
    serde_path_to_error::deserialize::<_, T>(deserializer)
        .map(|_| ())
        .map_err(|e| InvalidRequestError::InvalidRequestBody(e.to_string()))
}

/// Validates a JSON request body against the function's canonical schema.
///
/// Functions without a JSON body schema (multipart uploads, GET/DELETE
/// routes) validate trivially.
pub fn validate_request(
    function: FunctionName,
    body: &serde_json::Value,
) -> Result<(), InvalidRequestError> {
    use FunctionName::*;
    match function {
        ChatComplete | StreamChatComplete => {
            check::<chat::ChatCompletionRequest>(body)
        }
        Complete | StreamComplete => {
            check::<completions::CompletionRequest>(body)
        }
        Embed => check::<embeddings::EmbeddingRequest>(body),
        GenerateImage => check::<images::ImageGenerationRequest>(body),
        Moderate => check::<moderations::ModerationRequest>(body),
        CreateSpeech => check::<audio::SpeechRequest>(body),
        CreateFineTuning => check::<fine_tuning::FineTuningJobRequest>(body),
        CreateBatch => check::<batches::BatchRequest>(body),
        CreateModelResponse | StreamModelResponse => {
            check::<responses::ModelResponseRequest>(body)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_with_unknown_field_fails_validation() {
        let body = serde_json::json!({
            "model": "m",
            "messages": [{"role": "user", "content": "hi"}],
            "frobnicate": 1,
        });
        assert!(
            validate_request(FunctionName::ChatComplete, &body).is_err()
        );
    }

    #[test]
    fn get_routes_validate_trivially() {
        assert!(
            validate_request(
                FunctionName::ListModels,
                &serde_json::Value::Null
            )
            .is_ok()
        );
    }
}
