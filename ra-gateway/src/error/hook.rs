use displaydoc::Display;
use thiserror::Error;

/// Errors raised while executing a hook. These never fail the parent
/// request; they are demoted to a skipped hook result with an error
/// metadatum.
#[derive(Debug, Error, Display, strum::AsRefStr)]
pub enum HookError {
    /// Hook config is missing field `{0}`
    MissingConfig(&'static str),
    /// Hook HTTP call failed: {0}
    Http(#[from] reqwest::Error),
    /// Hook returned an invalid result: {0}
    InvalidResult(#[from] serde_json::Error),
    /// LLM hook dispatch failed: {0}
    Llm(String),
    /// Hook timed out
    Timeout,
}
