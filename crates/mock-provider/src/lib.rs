pub mod routes;

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU16, AtomicUsize},
    },
};

use axum::{
    Router,
    routing::{any, post},
};

/// Shared knobs and counters the tests poke at.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    /// Calls that reached the OpenAI-shaped chat route.
    pub openai_hits: Arc<AtomicUsize>,
    /// Calls that reached the Anthropic-shaped messages route.
    pub anthropic_hits: Arc<AtomicUsize>,
    /// Calls that reached any hook route.
    pub hook_hits: Arc<AtomicUsize>,
    /// When non-zero, the next `openai_fail_times` chat calls return this
    /// status before succeeding.
    pub openai_fail_status: Arc<AtomicU16>,
    pub openai_fail_times: Arc<AtomicUsize>,
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(routes::openai_chat))
        .route("/v1/embeddings", post(routes::openai_embeddings))
        .route("/v1/messages", post(routes::anthropic_messages))
        .route("/hook/allow", post(routes::hook_allow))
        .route("/hook/deny", post(routes::hook_deny))
        .route("/hook/override", post(routes::hook_override))
        .route("/{*path}", any(routes::not_found))
        .with_state(state)
}

/// A mock provider bound to an ephemeral local port.
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("can bind an ephemeral port");
        let addr = listener.local_addr().expect("bound socket has an addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server runs");
        });
        Self { addr, state }
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL mimicking an OpenAI-compatible `/v1` prefix.
    #[must_use]
    pub fn openai_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }
}
