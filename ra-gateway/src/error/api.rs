use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    auth::AuthError, internal::InternalError,
    invalid_req::InvalidRequestError, provider::ProviderError,
    stream::StreamError,
};
use crate::types::provider::InferenceProvider;

pub const INVALID_REQUEST_ERROR_TYPE: &str = "invalid_request_error";
pub const SERVER_ERROR_TYPE: &str = "server_error";

/// Common API errors
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum ApiError {
    /// Invalid request: {0}
    InvalidRequest(#[from] InvalidRequestError),
    /// Authentication error: {0}
    Authentication(#[from] AuthError),
    /// Internal error: {0}
    Internal(#[from] InternalError),
    /// Provider error: {0}
    Provider(#[from] ProviderError),
    /// Stream error: {0}
    StreamError(#[from] StreamError),
    /// Service panicked: {0}
    Panic(String),
}

/// This type mirrors the error body returned by the OpenAI API, extended
/// with the provider that produced it when one was involved.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<InferenceProvider>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: String, r#type: &str) -> Self {
        Self {
            error: ErrorDetails {
                message,
                r#type: Some(r#type.to_string()),
                param: None,
                code: None,
            },
            provider: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum_core::response::Response {
        match self {
            ApiError::InvalidRequest(error) => error.into_response(),
            ApiError::Authentication(error) => error.into_response(),
            ApiError::Internal(error) => error.into_response(),
            ApiError::Provider(error) => error.into_response(),
            ApiError::StreamError(error) => error.into_response(),
            ApiError::Panic(error) => {
                tracing::error!(error = %error, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(ErrorResponse::new(
                        "Internal server error".to_string(),
                        SERVER_ERROR_TYPE,
                    )),
                )
                    .into_response()
            }
        }
    }
}
