use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http::{HeaderMap, Method, StatusCode};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tokio::time::Instant;
use tracing::{Instrument, info_span};
use url::Url;

use crate::{
    config::{dispatcher::DispatcherConfig, retry::RetryConfig},
    error::{
        api::ApiError, init::InitError, internal::InternalError,
        provider::ProviderError, stream::StreamError,
    },
    mapper::parse_provider_error,
    types::provider::InferenceProvider,
    utils::retry::extract_retry_after,
};

/// Raw SSE payloads from the upstream (one `data:` payload per item).
pub type SSEStream =
    Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// Upstream statuses worth retrying.
#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_transport(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

/// One finished upstream exchange.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub attempts: u32,
}

/// Parameters for one outbound call.
pub struct UpstreamRequest<'a> {
    pub provider: &'a InferenceProvider,
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub retry: Option<&'a RetryConfig>,
}

/// The outbound HTTP client. Applies per-attempt timeouts, the retry policy
/// with `retry-after` overrides, and the total wall-clock budget.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: DispatcherConfig,
    default_retry: RetryConfig,
}

impl UpstreamClient {
    pub fn new(
        config: &DispatcherConfig,
        default_retry: Option<RetryConfig>,
    ) -> Result<Self, InitError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connection_timeout)
            .timeout(config.timeout)
            .tcp_nodelay(true)
            .build()
            .map_err(InitError::HttpClient)?;
        Ok(Self {
            client,
            config: config.clone(),
            default_retry: default_retry.unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn build(
        &self,
        request: &UpstreamRequest<'_>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder
    }

    async fn once(
        &self,
        request: &UpstreamRequest<'_>,
    ) -> Result<(StatusCode, HeaderMap, Bytes), reqwest::Error> {
        let response = self
            .build(request)
            .send()
            .await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok((status, headers, body))
    }

    /// Dispatches a non-streaming request, retrying transient failures per
    /// the retry policy. A timeout that exhausts the budget surfaces as
    /// 408.
    #[tracing::instrument(skip_all, fields(url = %request.url))]
    pub async fn dispatch_sync(
        &self,
        request: &UpstreamRequest<'_>,
    ) -> Result<UpstreamResponse, ApiError> {
        let retry = request.retry.unwrap_or(&self.default_retry);
        let mut backoff = retry.as_iterator();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let result = self.once(request).await;

            let retryable = match &result {
                Ok((status, ..)) => is_retryable_status(*status),
                Err(error) => is_retryable_transport(error),
            };
            if !retryable {
                return match result {
                    Ok((status, headers, body)) => Ok(UpstreamResponse {
                        status,
                        headers,
                        body,
                        attempts,
                    }),
                    Err(error) => {
                        Err(InternalError::Reqwest(error).into())
                    }
                };
            }

            let Some(delay) = backoff.next() else {
                return self.exhausted(request, result, attempts);
            };
            let delay = match &result {
                Ok((_, headers, _)) => extract_retry_after(headers)
                    .map(|d| d.min(self.config.retry_after_cap))
                    .unwrap_or(delay),
                Err(_) => delay,
            };
            if started.elapsed() + delay > self.config.total_budget {
                return self.exhausted(request, result, attempts);
            }
            tracing::warn!(
                attempt = attempts,
                retry_in = ?delay,
                "transient upstream failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn exhausted(
        &self,
        request: &UpstreamRequest<'_>,
        result: Result<(StatusCode, HeaderMap, Bytes), reqwest::Error>,
        attempts: u32,
    ) -> Result<UpstreamResponse, ApiError> {
        match result {
            // surface the provider's last word, the pipeline turns ≥400
            // into a canonical error
            Ok((status, headers, body)) => Ok(UpstreamResponse {
                status,
                headers,
                body,
                attempts,
            }),
            Err(error) if error.is_timeout() => {
                Err(ProviderError::Timeout {
                    provider: request.provider.clone(),
                }
                .into())
            }
            Err(error) => Err(InternalError::Reqwest(error).into()),
        }
    }

    /// Opens an SSE stream against the upstream, retrying connection-phase
    /// failures. The returned stream yields raw `data:` payloads; the
    /// `[DONE]` terminator is consumed here and re-appended downstream.
    pub async fn dispatch_stream(
        &self,
        request: &UpstreamRequest<'_>,
    ) -> Result<SSEStream, ApiError> {
        let retry = request.retry.unwrap_or(&self.default_retry);
        let mut backoff = retry.as_iterator();
        let started = Instant::now();

        loop {
            match self.try_stream(request).await {
                Ok(stream) => return Ok(stream),
                Err(error) => {
                    let retryable = match &error {
                        ApiError::StreamError(e) => e.is_retryable(),
                        ApiError::Provider(ProviderError::Upstream {
                            status,
                            ..
                        }) => is_retryable_status(*status),
                        _ => false,
                    };
                    let Some(delay) = backoff.next() else {
                        return Err(error);
                    };
                    if !retryable
                        || started.elapsed() + delay
                            > self.config.total_budget
                    {
                        return Err(error);
                    }
                    tracing::warn!(
                        error = %error,
                        retry_in = ?delay,
                        "stream connection failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn try_stream(
        &self,
        request: &UpstreamRequest<'_>,
    ) -> Result<SSEStream, ApiError> {
        let event_source = self
            .build(request)
            .eventsource()
            .map_err(|_| InternalError::Internal)?;
        sse_stream(event_source, request.provider.clone()).await
    }
}

/// Consumes an [`EventSource`] into a channel-backed stream. The first
/// event is awaited eagerly so connection errors propagate as errors
/// instead of broken streams.
async fn sse_stream(
    mut event_source: EventSource,
    provider: InferenceProvider,
) -> Result<SSEStream, ApiError> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    match event_source.next().await {
        Some(Ok(Event::Message(message))) => {
            if message.data != "[DONE]" {
                let _ = tx.send(Ok(Bytes::from(message.data)));
            }
        }
        Some(Ok(Event::Open)) => {}
        Some(Err(reqwest_eventsource::Error::InvalidStatusCode(
            status,
            response,
        ))) => {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                provider,
                status,
                details: parse_provider_error(status, &body),
            }
            .into());
        }
        Some(Err(error)) => {
            return Err(ApiError::StreamError(StreamError::StreamError(
                Box::new(error),
            )));
        }
        None => {}
    }

    tokio::spawn(
        async move {
            while let Some(event) = event_source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data == "[DONE]" {
                            break;
                        }
                        if tx.send(Ok(Bytes::from(message.data))).is_err() {
                            tracing::trace!(
                                "client dropped before stream ended"
                            );
                            break;
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(error) => {
                        let _ = tx.send(Err(ApiError::StreamError(
                            StreamError::StreamError(Box::new(error)),
                        )));
                        break;
                    }
                }
            }
            event_source.close();
        }
        .instrument(info_span!("sse_stream")),
    );

    Ok(Box::pin(
        tokio_stream::wrappers::UnboundedReceiverStream::new(rx),
    ))
}
