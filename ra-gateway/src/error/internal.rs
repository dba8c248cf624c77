use axum_core::response::IntoResponse;
use displaydoc::Display;
use http::StatusCode;
use thiserror::Error;

use super::api::{ErrorResponse, SERVER_ERROR_TYPE};
use crate::{cache::CacheError, store::StoreError};

/// Internal errors. These always surface as 500s without leaking details.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum InternalError {
    /// Internal error
    Internal,
    /// Failed to decrypt stored provider key
    DecryptionFailure,
    /// Storage error: {0}
    Store(#[from] StoreError),
    /// Cache error: {0}
    Cache(#[from] CacheError),
    /// Outbound request error: {0}
    Reqwest(#[from] reqwest::Error),
    /// Http error: {0}
    Http(#[from] http::Error),
    /// Failed to collect request body: {0}
    CollectBodyError(axum_core::Error),
    /// Extension not found: {0}
    ExtensionNotFound(&'static str),
    /// Serialization error: {0}
    Serialize(#[from] serde_json::Error),
    /// Invalid header value: {0}
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum_core::response::Response {
        tracing::error!(error = %self, "Internal server error");
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
