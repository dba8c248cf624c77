use displaydoc::Display;
use thiserror::Error;

use crate::{
    classify::FunctionName, types::provider::InferenceProvider,
};

/// Errors produced by the adapter engine while translating bodies.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum MapperError {
    /// Missing required parameter: {0}
    MissingRequiredParameter(&'static str),
    /// Provider {provider} does not support {function}
    UnsupportedFunction {
        provider: InferenceProvider,
        function: FunctionName,
    },
    /// Parameter transform failed: {0}
    TransformFailed(String),
    /// Serialization error: {0}
    Serialize(#[from] serde_json::Error),
    /// Request body has no model and the target resolved none
    MissingModel,
    /// Invalid base url: {0}
    InvalidBaseUrl(String),
    /// Invalid provider custom fields: {0}
    CustomFields(String),
}

impl From<MapperError> for crate::error::api::ApiError {
    fn from(error: MapperError) -> Self {
        use crate::error::{
            internal::InternalError, invalid_req::InvalidRequestError,
        };
        match error {
            MapperError::MissingRequiredParameter(field) => {
                InvalidRequestError::MissingRequiredParameter(field).into()
            }
            MapperError::UnsupportedFunction { provider, function } => {
                InvalidRequestError::UnsupportedFunction { provider, function }
                    .into()
            }
            MapperError::MissingModel => {
                InvalidRequestError::MissingModel.into()
            }
            MapperError::CustomFields(details) => {
                InvalidRequestError::InvalidCustomFields(details).into()
            }
            MapperError::Serialize(e) => InternalError::Serialize(e).into(),
            MapperError::TransformFailed(_)
            | MapperError::InvalidBaseUrl(_) => {
                tracing::error!(error = %error, "mapper failure");
                InternalError::Internal.into()
            }
        }
    }
}
