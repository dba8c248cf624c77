use axum_core::response::IntoResponse;
use futures::future::BoxFuture;
use http::Request;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use tower_http::auth::AsyncAuthorizeRequest;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    config::auth::{AUTH_EXEMPT_PREFIX, SESSION_COOKIE},
    error::auth::AuthError,
    types::extensions::AuthContext,
};

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Gateway authentication: a static bearer token, a session JWT cookie, or
/// open mode when neither is configured. Identity-provider routes are
/// exempt.
#[derive(Clone)]
pub struct AuthService {
    app_state: AppState,
}

impl AuthService {
    #[must_use]
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    fn authenticate<B>(
        app_state: &AppState,
        request: &Request<B>,
    ) -> Result<AuthContext, AuthError> {
        let auth = &app_state.config().auth;

        if let Some(expected) = &auth.bearer_token {
            let presented = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));
            if presented == Some(expected.expose().as_str()) {
                return Ok(AuthContext { user_id: None });
            }
        }

        if let Some(jwt_secret) = &auth.session_jwt_secret {
            if let Some(token) = session_cookie(request) {
                let decoded = jsonwebtoken::decode::<SessionClaims>(
                    &token,
                    &DecodingKey::from_secret(
                        jwt_secret.expose().as_bytes(),
                    ),
                    &Validation::default(),
                )
                .map_err(|_| AuthError::InvalidSessionToken)?;
                let user_id =
                    Uuid::parse_str(&decoded.claims.sub).ok();
                return Ok(AuthContext { user_id });
            }
        }

        if auth.is_open() {
            return Ok(AuthContext { user_id: None });
        }

        let has_any_credential = request
            .headers()
            .get(http::header::AUTHORIZATION)
            .is_some()
            || session_cookie(request).is_some();
        if has_any_credential {
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::MissingCredentials)
        }
    }
}

fn session_cookie<B>(request: &Request<B>) -> Option<String> {
    let cookies = request
        .headers()
        .get(http::header::COOKIE)?
        .to_str()
        .ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

impl<B> AsyncAuthorizeRequest<B> for AuthService
where
    B: Send + 'static,
{
    type RequestBody = B;
    type ResponseBody = axum_core::body::Body;
    type Future = BoxFuture<
        'static,
        Result<Request<B>, http::Response<Self::ResponseBody>>,
    >;

    #[tracing::instrument(skip_all)]
    fn authorize(&mut self, mut request: Request<B>) -> Self::Future {
        let app_state = self.app_state.clone();
        Box::pin(async move {
            if request.uri().path().starts_with(AUTH_EXEMPT_PREFIX) {
                return Ok(request);
            }
            match Self::authenticate(&app_state, &request) {
                Ok(auth_ctx) => {
                    request.extensions_mut().insert(auth_ctx);
                    Ok(request)
                }
                Err(error) => Err(error.into_response()),
            }
        })
    }
}
