use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid log filter directive: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Exporter {
    /// Human readable output, for local development.
    #[default]
    Pretty,
    /// Newline delimited JSON, for log collectors.
    Json,
    /// No output at all, for tests.
    Disabled,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directives, e.g.
    /// `info,ra_gateway=debug`.
    pub level: String,
    pub exporter: Exporter,
    /// Propagate panics into the tracing output.
    pub log_panics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            exporter: Exporter::default(),
            log_panics: true,
        }
    }
}

/// Install the global tracing subscriber according to `config`.
///
/// Returns an error if a subscriber was already installed, which in practice
/// only happens in tests that initialize telemetry more than once.
pub fn init_telemetry(config: &Config) -> Result<(), Error> {
    if config.log_panics {
        log_panics::Config::new()
            .backtrace_mode(log_panics::BacktraceMode::Resolved)
            .install_panic_hook();
    }
    let env_filter = EnvFilter::builder().parse(&config.level)?;
    match config.exporter {
        Exporter::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .try_init()?;
        }
        Exporter::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(true))
                .try_init()?;
        }
        Exporter::Disabled => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips() {
        let config = Config::default();
        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized = serde_json::from_str::<Config>(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn level_parses_as_env_filter() {
        let config = Config {
            level: "info,ra_gateway=trace".to_string(),
            ..Default::default()
        };
        assert!(EnvFilter::builder().parse(&config.level).is_ok());
    }
}
