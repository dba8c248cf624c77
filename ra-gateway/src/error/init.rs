use displaydoc::Display;
use thiserror::Error;

/// Errors during application startup.
#[derive(Debug, Error, Display)]
pub enum InitError {
    /// Failed to initialize telemetry: {0}
    Telemetry(#[from] telemetry::Error),
    /// Invalid config: {0}
    Config(#[from] Box<crate::config::Error>),
    /// Encryption key must be 64 hex characters (32 bytes)
    InvalidEncryptionKey,
    /// Failed to build the outbound HTTP client: {0}
    HttpClient(reqwest::Error),
    /// Failed to bind server address: {0}
    Bind(std::io::Error),
}
