use std::{
    sync::Arc,
    task::{Context, Poll},
};

use futures::future::BoxFuture;
use http::Request;

use crate::{
    app_state::AppState,
    error::{
        api::ApiError, internal::InternalError,
        invalid_req::InvalidRequestError,
    },
    types::{
        body::Body,
        config::{
            CONFIG_HEADER, CONFIG_HEADER_ALIAS, RequestConfigPreProcessed,
        },
        extensions::RequestContext,
    },
};

/// Parses the per-request config header, resolves the dispatch target and
/// binds agent + skill onto the request extensions.
#[derive(Debug, Clone)]
pub struct RequestContextLayer {
    app_state: AppState,
}

impl RequestContextLayer {
    #[must_use]
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl<S> tower::Layer<S> for RequestContextLayer {
    type Service = RequestContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestContextService {
            inner,
            app_state: self.app_state.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContextService<S> {
    inner: S,
    app_state: AppState,
}

fn parse_config_header<B>(
    request: &Request<B>,
) -> Result<RequestConfigPreProcessed, ApiError> {
    let raw = request
        .headers()
        .get(CONFIG_HEADER)
        .or_else(|| request.headers().get(CONFIG_HEADER_ALIAS))
        .ok_or(InvalidRequestError::MissingConfigHeader)?;
    let raw = raw
        .to_str()
        .map_err(|_| {
            InvalidRequestError::InvalidConfigHeader(
                "header is not valid UTF-8".to_string(),
            )
        })?;
    let deserializer = &mut serde_json::Deserializer::from_str(raw);
    let config: RequestConfigPreProcessed =
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            InvalidRequestError::InvalidConfigHeader(e.to_string())
        })?;
    if config.targets.is_empty() {
        return Err(InvalidRequestError::NoTargets.into());
    }
    if !config.targets.iter().all(|t| t.is_well_formed()) {
        return Err(InvalidRequestError::AmbiguousTarget.into());
    }
    Ok(config)
}

impl<S> tower::Service<Request<Body>> for RequestContextService<S>
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
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[tracing::instrument(name = "request_context", skip_all)]
    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        // see: https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let mut this = self.clone();
        std::mem::swap(self, &mut this);
        Box::pin(async move {
            let config = parse_config_header(&request)?;

            let store = this.app_state.store();
            let agent = store
                .get_agent_by_name(&config.agent_name)
                .await
                .map_err(InternalError::Store)?
                .ok_or_else(|| {
                    InvalidRequestError::AgentNotFound(
                        config.agent_name.clone(),
                    )
                })?;
            let skill = store
                .get_skill(agent.id, &config.skill_name)
                .await
                .map_err(InternalError::Store)?
                .ok_or_else(|| {
                    InvalidRequestError::SkillNotFound(
                        config.skill_name.clone(),
                    )
                })?;

            let target = this
                .app_state
                .resolver()
                .resolve_first(&skill, &config)
                .await?;

            let ctx = RequestContext {
                config,
                target,
                agent,
                skill,
            };
            request.extensions_mut().insert(Arc::new(ctx));
            this.inner.call(request).await
        })
    }
}
