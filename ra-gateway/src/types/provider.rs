use std::str::FromStr;

use compact_str::CompactString;
use strum::EnumIter;

/// Upstream AI providers the gateway can dispatch to.
///
/// Providers not covered by a dedicated variant deserialize into
/// [`InferenceProvider::Named`] and are served through the OpenAI-compatible
/// adapter with the target's `custom_host` as base URL.
#[derive(
    Debug,
    Clone,
    Default,
    Eq,
    Hash,
    PartialEq,
    EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    #[serde(rename = "azure-ai-foundry")]
    AzureAIFoundry,
    #[serde(rename = "workers-ai")]
    WorkersAI,
    #[serde(rename = "google-vertex")]
    GoogleVertex,
    #[serde(rename = "xai")]
    XAI,
    Anyscale,
    #[serde(rename = "ai21")]
    AI21,
    #[serde(rename = "siliconflow")]
    SiliconFlow,
    Deepseek,
    Mistral,
    Groq,
    Bedrock,
    #[serde(untagged)]
    Named(CompactString),
}

impl FromStr for InferenceProvider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<InferenceProvider, Self::Err> {
        match s {
            "openai" => Ok(InferenceProvider::OpenAI),
            "anthropic" => Ok(InferenceProvider::Anthropic),
            "azure-ai-foundry" => Ok(InferenceProvider::AzureAIFoundry),
            "workers-ai" => Ok(InferenceProvider::WorkersAI),
            "google-vertex" => Ok(InferenceProvider::GoogleVertex),
            "xai" => Ok(InferenceProvider::XAI),
            "anyscale" => Ok(InferenceProvider::Anyscale),
            "ai21" => Ok(InferenceProvider::AI21),
            "siliconflow" => Ok(InferenceProvider::SiliconFlow),
            "deepseek" => Ok(InferenceProvider::Deepseek),
            "mistral" => Ok(InferenceProvider::Mistral),
            "groq" => Ok(InferenceProvider::Groq),
            "bedrock" => Ok(InferenceProvider::Bedrock),
            s => Ok(InferenceProvider::Named(s.into())),
        }
    }
}

impl AsRef<str> for InferenceProvider {
    fn as_ref(&self) -> &str {
        match self {
            InferenceProvider::Named(name) => name.as_ref(),
            InferenceProvider::OpenAI => "openai",
            InferenceProvider::Anthropic => "anthropic",
            InferenceProvider::AzureAIFoundry => "azure-ai-foundry",
            InferenceProvider::WorkersAI => "workers-ai",
            InferenceProvider::GoogleVertex => "google-vertex",
            InferenceProvider::XAI => "xai",
            InferenceProvider::Anyscale => "anyscale",
            InferenceProvider::AI21 => "ai21",
            InferenceProvider::SiliconFlow => "siliconflow",
            InferenceProvider::Deepseek => "deepseek",
            InferenceProvider::Mistral => "mistral",
            InferenceProvider::Groq => "groq",
            InferenceProvider::Bedrock => "bedrock",
        }
    }
}

impl std::fmt::Display for InferenceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_provider_round_trip() {
        let provider = InferenceProvider::from_str("together").unwrap();
        assert_eq!(provider, InferenceProvider::Named("together".into()));
        assert_eq!(provider.as_ref(), "together");
    }

    #[test]
    fn known_providers_deserialize_from_kebab_case() {
        let provider: InferenceProvider =
            serde_json::from_str("\"workers-ai\"").unwrap();
        assert_eq!(provider, InferenceProvider::WorkersAI);
        let provider: InferenceProvider =
            serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(provider, InferenceProvider::Anthropic);
    }
}
