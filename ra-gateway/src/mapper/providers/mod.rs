pub mod anthropic;
pub mod openai;
pub mod openai_compatible;

use http::{HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use super::{
    TransformContext, capability::CapabilityRule, descriptor::FieldMap,
    stream::StreamState,
};
use crate::{
    classify::FunctionName, error::mapper::MapperError,
    types::config::ResolvedTarget,
};

const WORKERS_AI_API_BASE: &str =
    "https://api.cloudflare.com/client/v4/accounts";
const AZURE_API_VERSION: &str = "2024-10-21";

/// How the adapter authenticates against the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    Bearer,
    /// `x-api-key` plus the `anthropic-version` header.
    AnthropicApiKey,
    /// Azure's `api-key` header.
    AzureApiKey,
    NoAuth,
}

/// How the provider base URL is derived from the resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseUrl {
    /// Default URL, overridable by `custom_host`.
    Fixed(&'static str),
    /// The target must carry `custom_host`.
    CustomHostRequired,
    /// Cloudflare Workers AI: the account id is extracted from
    /// `custom_host`.
    WorkersAccount,
    /// Azure AI Foundry: the target must carry `azure_ai_foundry_url`.
    AzureFoundry,
}

/// How a canonical body becomes the provider body.
pub enum RequestMap {
    /// Provider speaks the canonical wire format already.
    Passthrough,
    Mapped(&'static [FieldMap]),
}

/// The four response-transform shapes.
pub enum ResponseTransform {
    /// Provider responses are already canonical.
    Passthrough,
    /// Whole non-streaming body in, canonical body out.
    Full(fn(Value, &TransformContext<'_>) -> Result<Value, MapperError>),
    /// One upstream SSE payload in, zero or more canonical chunks out.
    StreamChunk(
        fn(
            &str,
            &mut StreamState,
            &TransformContext<'_>,
        ) -> Result<Vec<Value>, MapperError>,
    ),
    /// Provider cannot stream this function: the upstream is called
    /// synchronously and its canonical JSON is re-emitted as SSE chunks.
    JsonToStream(
        fn(Value, &TransformContext<'_>) -> Result<Vec<Value>, MapperError>,
    ),
    /// Provider returns a whole non-SSE body in streaming mode; it is split
    /// into chunk frames.
    BodyToChunks(
        fn(Value, &TransformContext<'_>) -> Result<Vec<Value>, MapperError>,
    ),
}

impl ResponseTransform {
    /// Whether the upstream call must be made without streaming even though
    /// the client asked for a stream.
    #[must_use]
    pub fn requires_sync_upstream(&self) -> bool {
        matches!(self, Self::JsonToStream(_) | Self::BodyToChunks(_))
    }
}

/// Support entry for one canonical function. `endpoint` may contain a
/// `{model}` placeholder substituted at build time.
pub struct FunctionSupport {
    pub function: FunctionName,
    pub endpoint: &'static str,
    pub form_data: bool,
    pub request: RequestMap,
    pub response: ResponseTransform,
}

impl FunctionSupport {
    #[must_use]
    pub const fn passthrough(
        function: FunctionName,
        endpoint: &'static str,
    ) -> Self {
        Self {
            function,
            endpoint,
            form_data: false,
            request: RequestMap::Passthrough,
            response: ResponseTransform::Passthrough,
        }
    }

    #[must_use]
    pub const fn multipart(
        function: FunctionName,
        endpoint: &'static str,
    ) -> Self {
        Self {
            form_data: true,
            ..Self::passthrough(function, endpoint)
        }
    }
}

/// A provider's declarative adapter: URL/auth/endpoint slots plus the
/// per-function parameter maps and response transforms. Absence of a
/// function entry means the provider does not support it and the request is
/// rejected before dispatch.
pub struct ProviderAdapter {
    pub name: &'static str,
    pub api_key_required: bool,
    pub auth: AuthStyle,
    pub base_url: BaseUrl,
    pub functions: &'static [FunctionSupport],
    pub capabilities: &'static [CapabilityRule],
    /// Validator over the target's provider-specific custom fields.
    pub custom_fields: Option<
        fn(&serde_json::Map<String, Value>) -> Result<(), MapperError>,
    >,
}

impl ProviderAdapter {
    #[must_use]
    pub fn support(
        &self,
        function: FunctionName,
    ) -> Option<&FunctionSupport> {
        self.functions.iter().find(|s| s.function == function)
    }

    /// Path suffix for the function, with the model substituted into
    /// templated endpoints.
    #[must_use]
    pub fn endpoint(
        &self,
        function: FunctionName,
        model: &str,
    ) -> Option<String> {
        self.support(function)
            .map(|s| s.endpoint.replace("{model}", model))
    }

    pub fn resolve_base_url(
        &self,
        target: &ResolvedTarget,
    ) -> Result<Url, MapperError> {
        let parse = |raw: &str| {
            Url::parse(raw)
                .map_err(|e| MapperError::InvalidBaseUrl(e.to_string()))
        };
        match self.base_url {
            BaseUrl::Fixed(default) => match &target.custom_host {
                Some(custom_host) => parse(custom_host),
                None => parse(default),
            },
            BaseUrl::CustomHostRequired => {
                let custom_host =
                    target.custom_host.as_deref().ok_or_else(|| {
                        MapperError::InvalidBaseUrl(format!(
                            "provider {} requires custom_host",
                            self.name
                        ))
                    })?;
                parse(custom_host)
            }
            BaseUrl::WorkersAccount => {
                let custom_host =
                    target.custom_host.as_deref().ok_or_else(|| {
                        MapperError::InvalidBaseUrl(
                            "workers-ai requires custom_host carrying the \
                             account id"
                                .to_string(),
                        )
                    })?;
                if custom_host.starts_with("http://")
                    || custom_host.starts_with("https://")
                {
                    return parse(custom_host);
                }
                let account_id = extract_workers_account(custom_host);
                parse(&format!("{WORKERS_AI_API_BASE}/{account_id}/ai/v1"))
            }
            BaseUrl::AzureFoundry => target
                .azure_ai_foundry_url
                .clone()
                .ok_or_else(|| {
                    MapperError::InvalidBaseUrl(
                        "azure-ai-foundry requires azure_ai_foundry_url"
                            .to_string(),
                    )
                }),
        }
    }

    pub fn headers(
        &self,
        target: &ResolvedTarget,
    ) -> Result<HeaderMap, MapperError> {
        let mut headers = HeaderMap::new();
        let api_key = target.api_key.as_ref().map(|k| k.expose().as_str());
        let header_value = |value: String| {
            HeaderValue::from_str(&value).map_err(|_| {
                MapperError::TransformFailed(
                    "api key is not a valid header value".to_string(),
                )
            })
        };
        match (self.auth, api_key) {
            (AuthStyle::Bearer, Some(key)) => {
                headers.insert(
                    http::header::AUTHORIZATION,
                    header_value(format!("Bearer {key}"))?,
                );
            }
            (AuthStyle::AnthropicApiKey, Some(key)) => {
                headers
                    .insert("x-api-key", header_value(key.to_string())?);
                headers.insert(
                    "anthropic-version",
                    HeaderValue::from_static("2023-06-01"),
                );
            }
            (AuthStyle::AzureApiKey, Some(key)) => {
                headers.insert("api-key", header_value(key.to_string())?);
            }
            (AuthStyle::NoAuth, _) | (_, None) => {}
        }
        Ok(headers)
    }

    /// Azure routes carry an explicit API version query.
    #[must_use]
    pub fn query_suffix(&self) -> Option<String> {
        match self.base_url {
            BaseUrl::AzureFoundry => {
                Some(format!("api-version={AZURE_API_VERSION}"))
            }
            _ => None,
        }
    }

    pub fn validate_custom_fields(
        &self,
        custom_fields: &serde_json::Map<String, Value>,
    ) -> Result<(), MapperError> {
        match self.custom_fields {
            Some(validate) => validate(custom_fields),
            None => Ok(()),
        }
    }
}

fn extract_workers_account(custom_host: &str) -> &str {
    custom_host
        .split_once("accounts/")
        .map_or(custom_host, |(_, rest)| {
            rest.split('/').next().unwrap_or(rest)
        })
}

/// Looks up the adapter for a provider. Unknown (`Named`) providers fall
/// back to the generic OpenAI-compatible adapter with `custom_host` as base
/// URL.
#[must_use]
pub fn adapter_for(
    provider: &crate::types::provider::InferenceProvider,
) -> &'static ProviderAdapter {
    use crate::types::provider::InferenceProvider::*;
    match provider {
        OpenAI => &openai::OPENAI,
        Anthropic => &anthropic::ANTHROPIC,
        AzureAIFoundry => &openai_compatible::AZURE_AI_FOUNDRY,
        WorkersAI => &openai_compatible::WORKERS_AI,
        GoogleVertex => &openai_compatible::GOOGLE_VERTEX,
        XAI => &openai_compatible::XAI,
        Anyscale => &openai_compatible::ANYSCALE,
        AI21 => &openai_compatible::AI21,
        SiliconFlow => &openai_compatible::SILICONFLOW,
        Deepseek => &openai_compatible::DEEPSEEK,
        Mistral => &openai_compatible::MISTRAL,
        Groq => &openai_compatible::GROQ,
        Bedrock => &openai_compatible::BEDROCK,
        Named(_) => &openai_compatible::NAMED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_account_extraction() {
        assert_eq!(extract_workers_account("abc123"), "abc123");
        assert_eq!(
            extract_workers_account(
                "https://api.cloudflare.com/client/v4/accounts/abc123"
            ),
            "abc123"
        );
        assert_eq!(
            extract_workers_account("accounts/abc123/ai/v1"),
            "abc123"
        );
    }
}
