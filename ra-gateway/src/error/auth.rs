use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

use super::api::{ErrorResponse, INVALID_REQUEST_ERROR_TYPE};

/// Authentication errors
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,
    /// Invalid credentials
    InvalidCredentials,
    /// Invalid session token
    InvalidSessionToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum_core::response::Response {
        tracing::debug!(error = %self, "authentication rejected");
        let mut body =
            ErrorResponse::new(self.to_string(), INVALID_REQUEST_ERROR_TYPE);
        body.error.code = Some("invalid_api_key".to_string());
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}
