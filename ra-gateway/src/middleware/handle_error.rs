use std::{
    convert::Infallible,
    task::{Context, Poll},
};

use axum_core::response::IntoResponse;
use futures::future::BoxFuture;
use http::Request;

use crate::{error::api::ApiError, types::body::Body};

/// Converts pipeline errors into canonical HTTP error responses so the
/// outer service is infallible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandlerLayer;

impl<S> tower::Layer<S> for ErrorHandlerLayer {
    type Service = ErrorHandler<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorHandler { inner }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorHandler<S> {
    inner: S,
}

impl<S> tower::Service<Request<Body>> for ErrorHandler<S>
where
    S: tower::Service<
            Request<Body>,
            Response = http::Response<Body>,
            Error = ApiError,
        > + Send
        + Clone
        + 'static,
    S::Future: Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|_| unreachable!())
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut this = self.clone();
        std::mem::swap(&mut this, self);
        Box::pin(async move {
            match this.inner.call(request).await {
                Ok(response) => Ok(response),
                Err(error) => Ok(error.into_response()),
            }
        })
    }
}
