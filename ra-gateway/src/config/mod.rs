pub mod auth;
pub mod cache;
pub mod dispatcher;
pub mod retry;
pub mod server;

use std::path::PathBuf;

use config::ConfigError;
use displaydoc::Display;
use json_patch::merge;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::init::InitError;

const DEFAULT_CONFIG_PATH: &str = "/etc/ra-gateway/config.yaml";
const ENV_PREFIX: &str = "RA_GATEWAY";

#[derive(Debug, Error, Display)]
pub enum Error {
    /// error collecting config sources: {0}
    Source(#[from] ConfigError),
    /// deserialization error for input config: {0}
    InputConfigDeserialization(#[from] serde_path_to_error::Error<ConfigError>),
    /// deserialization error for merged config: {0}
    MergedConfigDeserialization(
        #[from] serde_path_to_error::Error<serde_json::Error>,
    ),
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    pub telemetry: telemetry::Config,
    pub server: self::server::ServerConfig,
    pub auth: self::auth::AuthConfig,
    pub cache: self::cache::CacheConfig,
    pub dispatcher: self::dispatcher::DispatcherConfig,
    /// Retry policy applied when the request config doesn't carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<self::retry::RetryConfig>,
}

impl Config {
    pub fn try_read(
        config_file_path: Option<PathBuf>,
    ) -> Result<Self, Box<Error>> {
        let mut default_config = serde_json::to_value(Self::default())
            .expect("default config is serializable");
        let mut builder = config::Config::builder();
        if let Some(path) = config_file_path {
            builder = builder.add_source(config::File::from(path));
        } else if std::fs::exists(DEFAULT_CONFIG_PATH).unwrap_or_default() {
            builder = builder.add_source(config::File::from(PathBuf::from(
                DEFAULT_CONFIG_PATH,
            )));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .convert_case(config::Case::Kebab),
        );
        let input_config: serde_json::Value = builder
            .build()
            .map_err(Error::from)
            .map_err(Box::new)?
            .try_deserialize()
            .map_err(Error::from)
            .map_err(Box::new)?;
        merge(&mut default_config, &input_config);

        let mut config: Config =
            serde_path_to_error::deserialize(default_config)
                .map_err(Error::from)
                .map_err(Box::new)?;

        // Secret fields serialize as `*****`, so the merge above clobbers
        // any secret present in Self::default(). Re-read them from their
        // dedicated environment variables after the merge.
        if let Ok(bearer_token) = std::env::var("RA_GATEWAY_BEARER_TOKEN") {
            config.auth.bearer_token = Some(bearer_token.into());
        }
        if let Ok(jwt_secret) = std::env::var("RA_GATEWAY_SESSION_JWT_SECRET")
        {
            config.auth.session_jwt_secret = Some(jwt_secret.into());
        }
        if let Ok(encryption_key) = std::env::var("RA_GATEWAY_ENCRYPTION_KEY")
        {
            config.auth.encryption_key = encryption_key.into();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InitError> {
        let key = self.auth.encryption_key.expose();
        if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InitError::InvalidEncryptionKey);
        }
        Ok(())
    }
}

#[cfg(feature = "testing")]
impl crate::tests::TestDefault for Config {
    fn test_default() -> Self {
        use crate::tests::TestDefault;
        let telemetry = telemetry::Config {
            exporter: telemetry::Exporter::Disabled,
            level: "info,ra_gateway=trace".to_string(),
            ..Default::default()
        };
        Config {
            telemetry,
            server: self::server::ServerConfig::test_default(),
            auth: self::auth::AuthConfig::test_default(),
            cache: self::cache::CacheConfig::test_default(),
            dispatcher: self::dispatcher::DispatcherConfig::test_default(),
            retries: Some(self::retry::RetryConfig::test_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_serializable() {
        // if it doesn't panic, it's good
        let _config = serde_json::to_string(&Config::default())
            .expect("default config is serializable");
    }

    #[test]
    fn default_config_validates_hex_key() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_encryption_key_is_rejected() {
        let mut config = Config::default();
        config.auth.encryption_key = "abcd".to_string().into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn server_round_trip() {
        let config = Config::default();
        let serialized = serde_json::to_string(&config.server).unwrap();
        let deserialized =
            serde_json::from_str::<self::server::ServerConfig>(&serialized)
                .unwrap();
        assert_eq!(config.server, deserialized);
    }

    #[test]
    fn dispatcher_round_trip() {
        let config = Config::default();
        let serialized = serde_json::to_string(&config.dispatcher).unwrap();
        let deserialized = serde_json::from_str::<
            self::dispatcher::DispatcherConfig,
        >(&serialized)
        .unwrap();
        assert_eq!(config.dispatcher, deserialized);
    }

    #[test]
    fn cache_round_trip() {
        let config = Config::default();
        let serialized = serde_json::to_string(&config.cache).unwrap();
        let deserialized =
            serde_json::from_str::<self::cache::CacheConfig>(&serialized)
                .unwrap();
        assert_eq!(config.cache, deserialized);
    }
}
