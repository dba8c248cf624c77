use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    auth::AsyncRequireAuthorizationLayer,
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::{
    api,
    app_state::AppState,
    config::Config,
    error::{init::InitError, runtime::RuntimeError},
    middleware::{
        auth::AuthService, handle_error::ErrorHandlerLayer,
        request_context::RequestContextLayer,
    },
    pipeline::Pipeline,
};

pub struct App {
    pub state: AppState,
    router: Router,
}

impl App {
    pub fn new(config: Config) -> Result<Self, InitError> {
        let state = AppState::new(config)?;
        let router = build_router(state.clone());
        Ok(Self { state, router })
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn serve(self) -> Result<(), RuntimeError> {
        let addr = self.state.config().server.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(InitError::Bind)?;
        tracing::info!(addr = %addr, "gateway listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("gateway shut down");
        Ok(())
    }
}

/// The full service tree: management API + the OpenAI-surface pipeline as
/// the fallback, both behind auth.
pub fn build_router(state: AppState) -> Router {
    let pipeline = ServiceBuilder::new()
        .layer(ErrorHandlerLayer)
        .layer(RequestContextLayer::new(state.clone()))
        .service(Pipeline::new(state.clone()));

    Router::new()
        .nest("/v1/reactive-agents", api::router(state.clone()))
        .fallback_service(pipeline)
        .layer(AsyncRequireAuthorizationLayer::new(AuthService::new(
            state.clone(),
        )))
        .layer(SetSensitiveRequestHeadersLayer::new([
            http::header::AUTHORIZATION,
            http::header::COOKIE,
        ]))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config().server.request_body_limit,
        ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
