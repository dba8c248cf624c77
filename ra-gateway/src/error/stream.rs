use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

use super::api::{ErrorResponse, SERVER_ERROR_TYPE};

/// Errors surfaced while proxying an upstream SSE stream.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum StreamError {
    /// Stream error: {0}
    StreamError(Box<reqwest_eventsource::Error>),
    /// Stream body error: {0}
    BodyError(axum_core::Error),
}

impl StreamError {
    /// Transient upstream conditions worth retrying before the stream has
    /// produced any data.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StreamError(inner) => match inner.as_ref() {
                reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
                    crate::dispatcher::is_retryable_status(*status)
                }
                reqwest_eventsource::Error::Transport(e) => {
                    e.is_connect() || e.is_timeout()
                }
                _ => false,
            },
            Self::BodyError(_) => false,
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> axum_core::response::Response {
        tracing::error!(error = %self, "stream error");
        let status = match &self {
            Self::StreamError(inner) => match inner.as_ref() {
                reqwest_eventsource::Error::InvalidStatusCode(status, _) => {
                    *status
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::BodyError(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            axum::Json(ErrorResponse::new(
                self.to_string(),
                SERVER_ERROR_TYPE,
            )),
        )
            .into_response()
    }
}
