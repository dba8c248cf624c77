pub mod merge;
pub mod tool_capture;

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, future::BoxFuture};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::time::Instant;
use tracing::Instrument;

use crate::{
    app_state::AppState,
    cache::{CacheLookup, fingerprint},
    classify::{FunctionName, classify},
    dispatcher::{SSEStream, UpstreamRequest},
    error::{
        api::ApiError, internal::InternalError,
        invalid_req::InvalidRequestError, provider::ProviderError,
    },
    hooks::HookInvocation,
    logger::service::LoggerService,
    mapper::{
        self, TransformContext,
        descriptor::JsonMap,
        providers::{self, FunctionSupport, ProviderAdapter, ResponseTransform},
        stream::StreamState,
    },
    schema::{self, stream::{DONE_FRAME, done_frame, frame}},
    types::{
        body::{Body, BodyReader},
        extensions::{RequestContext, SharedRequestContext},
        hook::{CacheMode, HookLog, HookResult},
        log::{CacheStatus, ProviderRequestLog},
    },
};

const CACHE_STATUS_HEADER: &str = "ra-cache-status";

/// The leaf service: classification, validation, cache, hooks, mapped
/// dispatch, response transforms, tool capture, logging.
#[derive(Debug, Clone)]
pub struct Pipeline {
    app_state: AppState,
}

impl Pipeline {
    #[must_use]
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl tower::Service<Request<Body>> for Pipeline {
    type Response = http::Response<Body>;
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    #[tracing::instrument(name = "pipeline", skip_all)]
    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let app_state = self.app_state.clone();
        Box::pin(async move { handle(app_state, request).await })
    }
}

struct Dispatch {
    ctx: SharedRequestContext,
    function: FunctionName,
    method: Method,
    path: String,
    start_time: DateTime<Utc>,
    cache_mode: CacheMode,
    cache_key: Option<String>,
    cache_status: CacheStatus,
    canonical: Option<JsonMap>,
    raw_body: Bytes,
    request_headers: HeaderMap,
}

#[allow(clippy::too_many_lines)]
async fn handle(
    app_state: AppState,
    request: Request<Body>,
) -> Result<http::Response<Body>, ApiError> {
    let start_time = Utc::now();
    let ctx: SharedRequestContext = request
        .extensions()
        .get::<Arc<RequestContext>>()
        .cloned()
        .ok_or(InternalError::ExtensionNotFound("RequestContext"))?;
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_headers = request.headers().clone();

    let raw_body = request
        .into_body()
        .collect()
        .await
        .map_err(collect_error)?
        .to_bytes();

    let body_value: Option<Value> = if raw_body.is_empty() {
        None
    } else if is_json(&request_headers) {
        Some(serde_json::from_slice(&raw_body).map_err(|e| {
            InvalidRequestError::InvalidRequestBody(e.to_string())
        })?)
    } else {
        None
    };
    let stream_flag = body_value
        .as_ref()
        .and_then(|v| v.get("stream"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let function = classify(&method, &path, stream_flag).ok_or_else(|| {
        InvalidRequestError::UnknownEndpoint(method.clone(), path.clone())
    })?;

    if function.expects_json_body() {
        let value = body_value.as_ref().ok_or_else(|| {
            InvalidRequestError::InvalidRequestBody(
                "a JSON body is required".to_string(),
            )
        })?;
        schema::validate_request(function, value)?;
    }

    // canonical body with the resolved configuration merged in
    let canonical = body_value.and_then(|value| match value {
        Value::Object(mut map) => {
            merge::apply(&mut map, &ctx.target, function);
            Some(map)
        }
        _ => None,
    });

    let cache_mode = ctx
        .config
        .cache
        .or(ctx.target.cache)
        .unwrap_or(app_state.config().cache.default_mode);

    let mut dispatch = Dispatch {
        ctx,
        function,
        method,
        path,
        start_time,
        cache_mode,
        cache_key: None,
        cache_status: CacheStatus::Disabled,
        canonical,
        raw_body,
        request_headers,
    };

    // cache read
    if function.is_cacheable() && cache_mode.is_enabled() {
        if let Some(canonical) = &dispatch.canonical {
            let key = fingerprint::request_fingerprint(
                function,
                &Value::Object(canonical.clone()),
            );
            if dispatch.ctx.config.force_refresh {
                dispatch.cache_status = CacheStatus::Refresh;
            } else {
                match app_state.0.cache.get(&key).await {
                    CacheLookup::Hit { value, .. } => {
                        return cache_hit_response(
                            &app_state, &dispatch, value,
                        );
                    }
                    _ => dispatch.cache_status = CacheStatus::Miss,
                }
            }
            dispatch.cache_key = Some(key);
        }
    }

    // input hooks
    let mut hook_logs: Vec<HookLog> = Vec::new();
    if !dispatch.ctx.config.hooks.is_empty() {
        let request_body = dispatch
            .canonical
            .clone()
            .map_or(Value::Null, Value::Object);
        let invocation = HookInvocation {
            function,
            request_body: &request_body,
            response_body: None,
            force_hook_refresh: dispatch.ctx.config.force_hook_refresh,
        };
        let outcome = app_state
            .0
            .hooks
            .run_input_hooks(&dispatch.ctx.config.hooks, &invocation)
            .await;
        hook_logs.extend(outcome.logs);

        if let Some(hook_id) = outcome.denied_by {
            emit_log(
                &app_state,
                &dispatch,
                StatusCode::FORBIDDEN.as_u16(),
                ProviderRequestLog::default(),
                hook_logs,
                None,
            );
            return Err(InvalidRequestError::DeniedByHook(hook_id).into());
        }
        if let Some(Value::Object(mut replaced)) =
            outcome.request_body_override
        {
            merge::apply(&mut replaced, &dispatch.ctx.target, function);
            dispatch.canonical = Some(replaced);
        }
    }

    dispatch_upstream(app_state, dispatch, hook_logs).await
}

/// Distinguishes the body-limit trip (413) from genuine transport errors.
fn collect_error(error: axum_core::Error) -> ApiError {
    let boxed = error.into_inner();
    let mut source: Option<&(dyn std::error::Error + 'static)> =
        Some(boxed.as_ref());
    while let Some(current) = source {
        if current
            .downcast_ref::<http_body_util::LengthLimitError>()
            .is_some()
        {
            return InvalidRequestError::PayloadTooLarge.into();
        }
        source = current.source();
    }
    InternalError::CollectBodyError(axum_core::Error::new(boxed)).into()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_none_or(|ct| ct.starts_with(mime::APPLICATION_JSON.as_ref()))
}

fn cache_hit_response(
    app_state: &AppState,
    dispatch: &Dispatch,
    value: String,
) -> Result<http::Response<Body>, ApiError> {
    let dispatch_log = ProviderRequestLog {
        response_body: serde_json::from_str(&value).ok(),
        ..Default::default()
    };
    emit_log_with_status(
        app_state,
        dispatch,
        StatusCode::OK.as_u16(),
        dispatch_log,
        Vec::new(),
        None,
        CacheStatus::Hit,
    );
    http::Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(CACHE_STATUS_HEADER, "HIT")
        .body(Body::from(value))
        .map_err(|e| InternalError::Http(e).into())
}

/// Builds the outbound request from the adapter and dispatches it.
#[allow(clippy::too_many_lines)]
async fn dispatch_upstream(
    app_state: AppState,
    dispatch: Dispatch,
    hook_logs: Vec<HookLog>,
) -> Result<http::Response<Body>, ApiError> {
    let target = &dispatch.ctx.target;
    let adapter = providers::adapter_for(&target.provider);
    let support = adapter.support(dispatch.function).ok_or_else(|| {
        InvalidRequestError::UnsupportedFunction {
            provider: target.provider.clone(),
            function: dispatch.function,
        }
    })?;

    let model = dispatch
        .canonical
        .as_ref()
        .and_then(|c| c.get("model"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| target.model.clone())
        .unwrap_or_default();

    // provider body via the declarative transform algorithm
    let provider_body: Option<Bytes> = match &dispatch.canonical {
        Some(canonical) => {
            let mut mapped = mapper::build_provider_body(
                adapter, support, canonical, &model,
            )?;
            if dispatch.function.is_stream()
                && support.response.requires_sync_upstream()
            {
                mapped.remove("stream");
            }
            Some(Bytes::from(serde_json::to_vec(&mapped).map_err(
                InternalError::Serialize,
            )?))
        }
        // multipart and body-less routes forward the original payload
        None if dispatch.raw_body.is_empty() => None,
        None => Some(dispatch.raw_body.clone()),
    };

    let url = build_url(adapter, &dispatch, &model)?;
    let headers =
        build_headers(adapter, support, &dispatch, provider_body.is_some())?;

    let request = UpstreamRequest {
        provider: &target.provider,
        method: dispatch.method.clone(),
        url: url.clone(),
        headers,
        body: provider_body.clone(),
        retry: target.retry.as_ref(),
    };

    let is_stream = dispatch.function.is_stream();
    let ctx_model = model.clone();

    if is_stream && !support.response.requires_sync_upstream() {
        let dispatch_started = Instant::now();
        let upstream = app_state.0.upstream.dispatch_stream(&request).await;
        let upstream = match upstream {
            Ok(upstream) => upstream,
            Err(error) => {
                let status = error_status(&error);
                emit_log(
                    &app_state,
                    &dispatch,
                    status,
                    provider_log_parts(
                        &url,
                        &dispatch.method,
                        0,
                        dispatch_started,
                        provider_body.as_deref(),
                        Some(&error.to_string()),
                        1,
                    ),
                    hook_logs,
                    None,
                );
                return Err(error);
            }
        };
        if dispatch.function.carries_tools()
            && let Some(canonical) = &dispatch.canonical
        {
            tool_capture::spawn_capture(
                Arc::clone(app_state.store()),
                dispatch.ctx.agent.id,
                canonical,
            );
        }
        // output hooks never run against a still-streaming body
        let mut hook_logs = hook_logs;
        hook_logs.extend(skipped_hook_logs(
            &dispatch.ctx.config.hooks,
            crate::types::hook::HookType::Output,
        ));
        return Ok(stream_response(
            app_state,
            dispatch,
            support,
            upstream,
            url,
            ctx_model,
            provider_body,
            hook_logs,
            dispatch_started,
        ));
    }

    // sync upstream (also used when synthesizing a stream)
    let dispatch_started = Instant::now();
    let response = match app_state.0.upstream.dispatch_sync(&request).await {
        Ok(response) => response,
        Err(error) => {
            let status = error_status(&error);
            emit_log(
                &app_state,
                &dispatch,
                status,
                provider_log_parts(
                    &url,
                    &dispatch.method,
                    0,
                    dispatch_started,
                    provider_body.as_deref(),
                    Some(&error.to_string()),
                    1,
                ),
                hook_logs,
                None,
            );
            return Err(error);
        }
    };

    let mut provider_log = provider_log_parts(
        &url,
        &dispatch.method,
        response.status.as_u16(),
        dispatch_started,
        provider_body.as_deref(),
        None,
        response.attempts,
    );

    if response.status.as_u16() >= 400 {
        let details =
            mapper::parse_provider_error(response.status, &response.body);
        provider_log.error = Some(details.message.clone());
        emit_log(
            &app_state,
            &dispatch,
            response.status.as_u16(),
            provider_log,
            hook_logs,
            None,
        );
        return Err(ProviderError::Upstream {
            provider: target.provider.clone(),
            status: response.status,
            details,
        }
        .into());
    }

    // binary passthrough (audio bytes, file content)
    let Ok(upstream_value) =
        serde_json::from_slice::<Value>(&response.body)
    else {
        emit_log(
            &app_state,
            &dispatch,
            response.status.as_u16(),
            provider_log,
            hook_logs,
            None,
        );
        let mut builder =
            http::Response::builder().status(response.status);
        if let Some(content_type) =
            response.headers.get(http::header::CONTENT_TYPE)
        {
            builder =
                builder.header(http::header::CONTENT_TYPE, content_type);
        }
        return builder
            .body(Body::from(response.body))
            .map_err(|e| InternalError::Http(e).into());
    };

    let tctx = TransformContext {
        provider: &target.provider,
        function: dispatch.function,
        model: &ctx_model,
        strict_openai_compliance: true,
    };
    let canonical_response =
        match mapper::transform_success(support, &tctx, upstream_value) {
            Ok(canonical) => canonical,
            Err(error) => {
                tracing::warn!(error = %error, "provider response failed shape translation");
                provider_log.error = Some(error.to_string());
                emit_log(
                    &app_state,
                    &dispatch,
                    StatusCode::BAD_GATEWAY.as_u16(),
                    provider_log,
                    hook_logs,
                    None,
                );
                return Err(ProviderError::invalid_response(
                    target.provider.clone(),
                )
                .into());
            }
        };
    provider_log.response_body = Some(canonical_response.clone());

    // synthesized stream for providers without native SSE
    if is_stream {
        let chunks = match &support.response {
            ResponseTransform::JsonToStream(transform)
            | ResponseTransform::BodyToChunks(transform) => {
                (transform)(canonical_response, &tctx)?
            }
            _ => Vec::new(),
        };
        let mut hook_logs = hook_logs;
        hook_logs.extend(skipped_hook_logs(
            &dispatch.ctx.config.hooks,
            crate::types::hook::HookType::Output,
        ));
        return Ok(synthesized_stream_response(
            app_state, dispatch, chunks, provider_log, hook_logs,
        ));
    }

    // output hooks gate only successful, fully-collected responses
    let mut hook_logs = hook_logs;
    let mut canonical_response = canonical_response;
    if response.status == StatusCode::OK
        && !dispatch.function.is_embed()
        && !dispatch.ctx.config.hooks.is_empty()
    {
        let request_body = dispatch
            .canonical
            .clone()
            .map_or(Value::Null, Value::Object);
        let invocation = HookInvocation {
            function: dispatch.function,
            request_body: &request_body,
            response_body: Some(&canonical_response),
            force_hook_refresh: dispatch.ctx.config.force_hook_refresh,
        };
        let outcome = app_state
            .0
            .hooks
            .run_output_hooks(&dispatch.ctx.config.hooks, &invocation)
            .await;
        hook_logs.extend(outcome.logs);
        if let Some(replaced) = outcome.response_body_override {
            canonical_response = replaced;
        }
    }

    // tool capture is best-effort and must not block emission
    if dispatch.function.carries_tools()
        && let Some(canonical) = &dispatch.canonical
    {
        tool_capture::spawn_capture(
            Arc::clone(app_state.store()),
            dispatch.ctx.agent.id,
            canonical,
        );
    }

    let serialized = serde_json::to_string(&canonical_response)
        .map_err(InternalError::Serialize)?;

    // cache write: success, non-streaming, simple mode only
    if response.status.as_u16() < 400
        && dispatch.cache_mode == CacheMode::Simple
        && let Some(key) = dispatch.cache_key.clone()
    {
        app_state.0.cache.put(key, serialized.clone()).await;
    }

    let cache_status = dispatch.cache_status;
    emit_log_with_status(
        &app_state,
        &dispatch,
        response.status.as_u16(),
        provider_log,
        hook_logs,
        None,
        cache_status,
    );

    http::Response::builder()
        .status(response.status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(
            CACHE_STATUS_HEADER,
            cache_status.to_string(),
        )
        .body(Body::from(serialized))
        .map_err(|e| InternalError::Http(e).into())
}

fn error_status(error: &ApiError) -> u16 {
    match error {
        ApiError::Provider(provider_error) => {
            provider_error.status().as_u16()
        }
        _ => StatusCode::BAD_GATEWAY.as_u16(),
    }
}

fn provider_log_parts(
    url: &url::Url,
    method: &Method,
    status: u16,
    started: Instant,
    request_body: Option<&[u8]>,
    error: Option<&str>,
    attempts: u32,
) -> ProviderRequestLog {
    ProviderRequestLog {
        url: Some(url.to_string()),
        method: Some(method.to_string()),
        status,
        duration: i64::try_from(started.elapsed().as_millis())
            .unwrap_or(i64::MAX),
        request_body: request_body
            .and_then(|body| serde_json::from_slice(body).ok()),
        response_body: None,
        error: error.map(str::to_string),
        attempts,
    }
}

fn build_url(
    adapter: &ProviderAdapter,
    dispatch: &Dispatch,
    model: &str,
) -> Result<url::Url, ApiError> {
    let base = adapter.resolve_base_url(&dispatch.ctx.target)?;
    let endpoint = adapter
        .endpoint(dispatch.function, model)
        .expect("support checked by caller");
    let suffix = dispatch
        .path
        .strip_prefix("/v1")
        .unwrap_or(&dispatch.path);
    let endpoint = endpoint.replace("{path}", suffix);
    let mut joined = format!(
        "{}{}",
        base.as_str().trim_end_matches('/'),
        endpoint
    );
    if let Some(query) = adapter.query_suffix() {
        let separator = if joined.contains('?') { '&' } else { '?' };
        joined.push(separator);
        joined.push_str(&query);
    }
    url::Url::parse(&joined).map_err(|e| {
        crate::error::mapper::MapperError::InvalidBaseUrl(e.to_string())
            .into()
    })
}

fn build_headers(
    adapter: &ProviderAdapter,
    support: &FunctionSupport,
    dispatch: &Dispatch,
    has_body: bool,
) -> Result<HeaderMap, ApiError> {
    let mut headers = adapter.headers(&dispatch.ctx.target)?;
    if has_body {
        if support.form_data {
            // multipart bodies keep the client's boundary header
            if let Some(content_type) = dispatch
                .request_headers
                .get(http::header::CONTENT_TYPE)
            {
                headers
                    .insert(http::header::CONTENT_TYPE, content_type.clone());
            }
        } else {
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
    }
    for name in &dispatch.ctx.config.forward_headers {
        if let Ok(header_name) =
            http::header::HeaderName::from_bytes(name.as_bytes())
            && let Some(value) = dispatch.request_headers.get(&header_name)
        {
            headers.insert(header_name, value.clone());
        }
    }
    Ok(headers)
}

/// Proxies a native upstream SSE stream: transform each chunk, frame it,
/// tee it for logging, always terminate with `[DONE]`.
#[allow(clippy::too_many_arguments)]
fn stream_response(
    app_state: AppState,
    dispatch: Dispatch,
    support: &'static FunctionSupport,
    mut upstream: SSEStream,
    url: url::Url,
    model: String,
    provider_body: Option<Bytes>,
    hook_logs: Vec<HookLog>,
    dispatch_started: Instant,
) -> http::Response<Body> {
    let (tx, rx) =
        tokio::sync::mpsc::unbounded_channel::<Result<Bytes, ApiError>>();
    let provider = dispatch.ctx.target.provider.clone();
    let function = dispatch.function;

    tokio::spawn(
        async move {
            let mut state = StreamState::default();
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(payload) => {
                        let payload = String::from_utf8_lossy(&payload);
                        let tctx = TransformContext {
                            provider: &provider,
                            function,
                            model: &model,
                            strict_openai_compliance: true,
                        };
                        let chunks = match &support.response {
                            ResponseTransform::StreamChunk(transform) => {
                                match (transform)(&payload, &mut state, &tctx)
                                {
                                    Ok(chunks) => chunks,
                                    Err(error) => {
                                        tracing::warn!(error = %error, "dropping untranslatable chunk");
                                        continue;
                                    }
                                }
                            }
                            _ => match serde_json::from_str::<Value>(&payload)
                            {
                                Ok(chunk) => vec![chunk],
                                Err(_) => continue,
                            },
                        };
                        for chunk in chunks {
                            if tx.send(Ok(frame(&chunk))).is_err() {
                                // client went away; dropping the upstream
                                // stream cancels the provider call
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        let _ = tx.send(Err(error));
                        return;
                    }
                }
            }
            let _ = tx.send(Ok(done_frame()));
        }
        .instrument(tracing::Span::current()),
    );

    let stream = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);
    let (body, reader) = BodyReader::wrap_stream(stream);

    spawn_stream_logger(
        app_state,
        dispatch,
        reader,
        url,
        provider_body,
        hook_logs,
        dispatch_started,
    );

    sse_response(body)
}

/// Emits a synthesized stream (whole-body-to-chunks) as SSE.
fn synthesized_stream_response(
    app_state: AppState,
    dispatch: Dispatch,
    chunks: Vec<Value>,
    provider_log: ProviderRequestLog,
    hook_logs: Vec<HookLog>,
) -> http::Response<Body> {
    let mut frames: Vec<Result<Bytes, ApiError>> =
        chunks.iter().map(|chunk| Ok(frame(chunk))).collect();
    frames.push(Ok(done_frame()));
    let stream = futures::stream::iter(frames);
    let (body, reader) = BodyReader::wrap_stream(stream);

    let app_state_cloned = app_state.clone();
    tokio::spawn(
        async move {
            let _collected = reader.collect().await;
            emit_log(
                &app_state_cloned,
                &dispatch,
                StatusCode::OK.as_u16(),
                provider_log,
                hook_logs,
                None,
            );
        }
        .instrument(tracing::Span::current()),
    );

    sse_response(body)
}

fn sse_response(body: Body) -> http::Response<Body> {
    http::Response::builder()
        .status(StatusCode::OK)
        .header(
            http::header::CONTENT_TYPE,
            "text/event-stream; charset=utf-8",
        )
        .header(http::header::CONNECTION, "keep-alive")
        .body(body)
        .expect("static headers are valid")
}

#[allow(clippy::too_many_arguments)]
fn spawn_stream_logger(
    app_state: AppState,
    dispatch: Dispatch,
    reader: BodyReader,
    url: url::Url,
    provider_body: Option<Bytes>,
    hook_logs: Vec<HookLog>,
    dispatch_started: Instant,
) {
    tokio::spawn(
        async move {
            let collected = reader.collect().await;
            let text = String::from_utf8_lossy(&collected);
            let cancelled = !text.ends_with(DONE_FRAME);
            let mut provider_log = provider_log_parts(
                &url,
                &dispatch.method,
                StatusCode::OK.as_u16(),
                dispatch_started,
                provider_body.as_deref(),
                None,
                1,
            );
            provider_log.response_body =
                Some(Value::String(text.into_owned()));
            emit_log(
                &app_state,
                &dispatch,
                StatusCode::OK.as_u16(),
                provider_log,
                hook_logs,
                cancelled.then(|| "cancelled".to_string()),
            );
        }
        .instrument(tracing::Span::current()),
    );
}

fn emit_log(
    app_state: &AppState,
    dispatch: &Dispatch,
    status: u16,
    provider_log: ProviderRequestLog,
    hook_logs: Vec<HookLog>,
    outcome: Option<String>,
) {
    emit_log_with_status(
        app_state,
        dispatch,
        status,
        provider_log,
        hook_logs,
        outcome,
        dispatch.cache_status,
    );
}

#[allow(clippy::too_many_arguments)]
fn emit_log_with_status(
    app_state: &AppState,
    dispatch: &Dispatch,
    status: u16,
    provider_log: ProviderRequestLog,
    hook_logs: Vec<HookLog>,
    outcome: Option<String>,
    cache_status: CacheStatus,
) {
    let logger = LoggerService::builder()
        .sink(app_state.0.sink.clone())
        .ctx(Arc::clone(&dispatch.ctx))
        .method(dispatch.method.to_string())
        .endpoint(dispatch.path.clone())
        .function(dispatch.function)
        .status(status)
        .start_time(dispatch.start_time)
        .provider_log(provider_log)
        .hook_logs(hook_logs)
        .cache_status(cache_status)
        .outcome(outcome)
        .model(None)
        .build();
    tokio::spawn(
        async move { logger.log().await }
            .instrument(tracing::Span::current()),
    );
}

/// Records hooks that were skipped by policy (output hooks on streaming
/// responses) without executing them.
#[must_use]
pub fn skipped_hook_logs(
    hooks: &[crate::types::hook::Hook],
    hook_type: crate::types::hook::HookType,
) -> Vec<HookLog> {
    let now = Utc::now();
    hooks
        .iter()
        .filter(|h| h.hook_type == hook_type)
        .map(|hook| HookLog {
            hook_id: hook.id,
            hook_type: hook.hook_type,
            hook_provider: hook.hook_provider,
            start_time: now,
            end_time: now,
            duration: 0,
            result: HookResult::skipped(),
            cache_status: CacheStatus::Disabled,
            metadata: None,
        })
        .collect()
}
