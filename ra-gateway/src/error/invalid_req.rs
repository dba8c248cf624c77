use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::api::{ErrorResponse, INVALID_REQUEST_ERROR_TYPE};
use crate::{
    classify::FunctionName, types::provider::InferenceProvider,
};

/// User errors
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum InvalidRequestError {
    /// No route matches {0} {1}
    UnknownEndpoint(http::Method, String),
    /// Invalid request body: {0}
    InvalidRequestBody(String),
    /// Missing config header (`x-idk-config` or `ra-config`)
    MissingConfigHeader,
    /// Invalid config header: {0}
    InvalidConfigHeader(String),
    /// Each target must set exactly one of `configuration_name` or `provider`
    AmbiguousTarget,
    /// Config must declare at least one target
    NoTargets,
    /// `model` is required when `provider` is set directly
    MissingModel,
    /// Agent not found: {0}
    AgentNotFound(String),
    /// Skill not found: {0}
    SkillNotFound(String),
    /// Configuration not found: {0}
    ConfigurationNotFound(String),
    /// Configuration {name} has no version {version}
    ConfigurationVersionNotFound { name: String, version: String },
    /// Model not found: {0}
    ModelNotFound(Uuid),
    /// No API key stored for id {0}
    ApiKeyNotFound(Uuid),
    /// Provider {0} requires an API key and none was resolved
    MissingApiKey(InferenceProvider),
    /// Provider {provider} does not support {function}
    UnsupportedFunction {
        provider: InferenceProvider,
        function: FunctionName,
    },
    /// Missing required parameter: {0}
    MissingRequiredParameter(&'static str),
    /// Invalid provider custom fields: {0}
    InvalidCustomFields(String),
    /// Request denied by input hook {0}
    DeniedByHook(Uuid),
    /// Request body too large
    PayloadTooLarge,
    /// Too many requests
    RateLimited,
    /// Duplicate name: {0}
    DuplicateName(String),
}

impl InvalidRequestError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownEndpoint(..)
            | Self::AgentNotFound(_)
            | Self::SkillNotFound(_) => StatusCode::NOT_FOUND,
            Self::DeniedByHook(_) => StatusCode::FORBIDDEN,
            Self::DuplicateName(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UnsupportedFunction { .. }
            | Self::MissingRequiredParameter(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for InvalidRequestError {
    fn into_response(self) -> axum_core::response::Response {
        debug!(error = %self, "Invalid request");
        let status = self.status();
        let body =
            ErrorResponse::new(self.to_string(), INVALID_REQUEST_ERROR_TYPE);
        (status, axum::Json(body)).into_response()
    }
}
