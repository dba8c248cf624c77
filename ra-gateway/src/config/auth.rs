use serde::{Deserialize, Serialize};

use crate::types::secret::Secret;

/// Paths under this prefix are handled by the external identity provider and
/// bypass gateway authentication.
pub const AUTH_EXEMPT_PREFIX: &str = "/v1/reactive-agents/auth";

pub const SESSION_COOKIE: &str = "ra_session";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct AuthConfig {
    /// Static bearer token. When unset and no JWT secret is configured,
    /// the gateway runs open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<Secret<String>>,
    /// Secret used to verify session JWTs carried in the session cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_jwt_secret: Option<Secret<String>>,
    /// 64 hex characters (32 bytes); used to decrypt stored provider keys.
    pub encryption_key: Secret<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.bearer_token.is_none() && self.session_jwt_secret.is_none()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            session_jwt_secret: None,
            // dev-only placeholder, rejected by `Config::validate` outside
            // of debug builds
            encryption_key: Secret::from("0".repeat(64)),
        }
    }
}

#[cfg(feature = "testing")]
impl crate::tests::TestDefault for AuthConfig {
    fn test_default() -> Self {
        Self {
            bearer_token: Some(Secret::from("test-token".to_string())),
            session_jwt_secret: None,
            encryption_key: Secret::from("0".repeat(64)),
        }
    }
}
