use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

use super::api::{ErrorDetails, ErrorResponse, SERVER_ERROR_TYPE};
use crate::types::provider::InferenceProvider;

/// Errors originating from an upstream provider.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum ProviderError {
    /// Upstream {provider} returned {status}
    Upstream {
        provider: InferenceProvider,
        status: StatusCode,
        details: ErrorDetails,
    },
    /// Upstream {provider} returned a malformed response
    InvalidProviderResponse { provider: InferenceProvider },
    /// Upstream {provider} timed out after exhausting retries
    Timeout { provider: InferenceProvider },
}

impl ProviderError {
    /// A 200 upstream whose body does not match the expected provider shape.
    #[must_use]
    pub fn invalid_response(provider: InferenceProvider) -> Self {
        Self::InvalidProviderResponse { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &InferenceProvider {
        match self {
            Self::Upstream { provider, .. }
            | Self::InvalidProviderResponse { provider }
            | Self::Timeout { provider } => provider,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::InvalidProviderResponse { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ProviderError {
    fn into_response(self) -> axum_core::response::Response {
        let status = self.status();
        let provider = self.provider().clone();
        let body = match self {
            Self::Upstream { details, .. } => ErrorResponse {
                error: details,
                provider: Some(provider),
            },
            other => {
                let mut body =
                    ErrorResponse::new(other.to_string(), SERVER_ERROR_TYPE);
                body.provider = Some(provider);
                body
            }
        };
        (status, axum::Json(body)).into_response()
    }
}
