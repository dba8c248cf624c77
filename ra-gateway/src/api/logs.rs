use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use crate::app_state::AppState;

/// Live feed of emitted logs as SSE, one JSON log per event. Slow
/// subscribers that lag the broadcast buffer miss entries rather than
/// blocking emission.
pub async fn live(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let receiver = app_state.0.sink.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|item| {
        match item {
            Ok(log) => Event::default()
                .json_data(log.as_ref())
                .map_err(|error| {
                    tracing::error!(error = %error, "failed to serialize live log");
                })
                .ok()
                .map(Ok),
            Err(lagged) => {
                tracing::debug!(error = %lagged, "live log subscriber lagged");
                None
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
