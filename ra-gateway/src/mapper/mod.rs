pub mod capability;
pub mod descriptor;
pub mod providers;
pub mod stream;

use serde_json::Value;

use self::{
    descriptor::JsonMap,
    providers::{FunctionSupport, ProviderAdapter, RequestMap, ResponseTransform},
};
use crate::{
    classify::FunctionName,
    error::{api::ErrorDetails, mapper::MapperError},
    types::provider::InferenceProvider,
};

/// Context handed to response transforms.
pub struct TransformContext<'a> {
    pub provider: &'a InferenceProvider,
    pub function: FunctionName,
    pub model: &'a str,
    pub strict_openai_compliance: bool,
}

/// Runs the declarative transform algorithm: field maps first, then the
/// provider's model-capability table over the mapped body.
pub fn build_provider_body(
    adapter: &ProviderAdapter,
    support: &FunctionSupport,
    body: &JsonMap,
    model: &str,
) -> Result<JsonMap, MapperError> {
    let mut mapped = match support.request {
        RequestMap::Passthrough => body.clone(),
        RequestMap::Mapped(maps) => descriptor::apply_field_maps(maps, body)?,
    };
    capability::apply(adapter.capabilities, model, &mut mapped);
    Ok(mapped)
}

/// Minimal shape every canonical success body must have, per function.
/// A 200 upstream failing this check is treated as a 502.
#[must_use]
pub fn expected_shape_ok(function: FunctionName, body: &Value) -> bool {
    use FunctionName::*;
    match function {
        ChatComplete | Complete => {
            body.get("choices").is_some_and(Value::is_array)
        }
        Embed => body.get("data").is_some_and(Value::is_array),
        GenerateImage => body.get("data").is_some_and(Value::is_array),
        Moderate => body.get("results").is_some_and(Value::is_array),
        CreateModelResponse => {
            body.get("output").is_some_and(Value::is_array)
        }
        _ => true,
    }
}

/// Applies the function's non-streaming response transform to a success
/// body and verifies the canonical shape.
pub fn transform_success(
    support: &FunctionSupport,
    ctx: &TransformContext<'_>,
    body: Value,
) -> Result<Value, MapperError> {
    let canonical = match &support.response {
        ResponseTransform::Full(transform) => (transform)(body, ctx)?,
        _ => body,
    };
    if !expected_shape_ok(ctx.function, &canonical) {
        return Err(MapperError::TransformFailed(format!(
            "canonical {} body failed shape check",
            ctx.function
        )));
    }
    Ok(canonical)
}

/// Parses an upstream error body into canonical error details, tolerating
/// the OpenAI and Anthropic wire shapes before falling back to raw text.
#[must_use]
pub fn parse_provider_error(
    status: http::StatusCode,
    body: &[u8],
) -> ErrorDetails {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(error) = value.get("error") {
            return ErrorDetails {
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("upstream error")
                    .to_string(),
                r#type: error
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                param: error
                    .get("param")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                code: error
                    .get("code")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
        }
    }
    let mut message = String::from_utf8_lossy(body).into_owned();
    if message.is_empty() {
        message = format!("upstream returned {status}");
    }
    message.truncate(512);
    ErrorDetails {
        message,
        r#type: None,
        param: None,
        code: None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn openai_error_body_parses_into_details(){
        let body = json!({
            "error": {"message": "bad key", "type": "invalid_request_error",
                      "code": "invalid_api_key"}
        });
        let details = parse_provider_error(
            http::StatusCode::UNAUTHORIZED,
            body.to_string().as_bytes(),
        );
        assert_eq!(details.message, "bad key");
        assert_eq!(details.code.as_deref(), Some("invalid_api_key"));
    }

    #[test]
    fn anthropic_error_body_parses_into_details() {
        let body = json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "overloaded"}
        });
        let details = parse_provider_error(
            http::StatusCode::TOO_MANY_REQUESTS,
            body.to_string().as_bytes(),
        );
        assert_eq!(details.message, "overloaded");
        assert_eq!(details.r#type.as_deref(), Some("overloaded_error"));
    }

    #[test]
    fn non_json_error_body_falls_back_to_text() {
        let details = parse_provider_error(
            http::StatusCode::BAD_GATEWAY,
            b"<html>bad gateway</html>",
        );
        assert_eq!(details.message, "<html>bad gateway</html>");
    }

    #[test]
    fn shape_check_rejects_missing_choices() {
        assert!(!expected_shape_ok(
            FunctionName::ChatComplete,
            &json!({"unexpected": true})
        ));
        assert!(expected_shape_ok(
            FunctionName::ChatComplete,
            &json!({"choices": []})
        ));
    }
}
